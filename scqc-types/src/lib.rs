//! Core data types for single-cell QC: the annotated matrix container,
//! typed metadata tables, and named control sets.

pub mod container;
pub mod controls;
pub mod error;
pub mod table;

pub use container::{AnnMatrix, Assay};
pub use controls::ControlSets;
pub use error::QcError;
pub use table::{Column, MetaTable};
