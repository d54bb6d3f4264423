//! # scqc: Single-cell quality control in Rust

#![deny(missing_docs)]
#![deny(warnings)]

/// Per-sample and per-feature QC metric computation
pub mod metrics;

/// Library-size normalization helpers
pub mod normalization;

/// Robust outlier flagging on QC metric vectors
pub mod outliers;

/// Statistics functions
pub mod stats;

pub use scqc_types::{AnnMatrix, Assay, Column, ControlSets, MetaTable, QcError};
