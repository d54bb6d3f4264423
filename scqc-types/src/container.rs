use crate::error::QcError;
use crate::table::MetaTable;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

/// A named feature x sample matrix. Rows are features, columns are samples.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assay {
    /// Assay name, e.g. "counts" or "tpm"
    pub name: String,
    /// Feature x sample values
    pub matrix: Array2<f64>,
}

/// In-memory annotated matrix: one or more same-shaped assays plus
/// per-sample and per-feature metadata tables.
///
/// Every assay shares the shape `(n_features, n_samples)` and the row and
/// column ordering given by the id vectors; metadata row order matches the
/// corresponding assay axis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnMatrix {
    feature_ids: Vec<String>,
    sample_ids: Vec<String>,
    assays: Vec<Assay>,
    feature_meta: MetaTable,
    sample_meta: MetaTable,
}

impl AnnMatrix {
    /// Build a container around a primary assay. The id vectors fix the
    /// dimensions every later assay must match.
    pub fn new(
        name: &str,
        matrix: Array2<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<AnnMatrix, QcError> {
        if matrix.nrows() != feature_ids.len() || matrix.ncols() != sample_ids.len() {
            return Err(QcError::AssayShape {
                name: name.to_string(),
                rows: matrix.nrows(),
                cols: matrix.ncols(),
                expected_rows: feature_ids.len(),
                expected_cols: sample_ids.len(),
            });
        }
        let feature_meta = MetaTable::new(feature_ids.len());
        let sample_meta = MetaTable::new(sample_ids.len());
        Ok(AnnMatrix {
            feature_ids,
            sample_ids,
            assays: vec![Assay {
                name: name.to_string(),
                matrix,
            }],
            feature_meta,
            sample_meta,
        })
    }

    /// Number of features (assay rows).
    pub fn n_features(&self) -> usize {
        self.feature_ids.len()
    }

    /// Number of samples (assay columns).
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Feature identifiers, in assay row order.
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers, in assay column order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Add another assay. Its shape must match the container exactly.
    pub fn add_assay(&mut self, name: &str, matrix: Array2<f64>) -> Result<(), QcError> {
        if self.assays.iter().any(|a| a.name == name) {
            return Err(QcError::DuplicateAssay(name.to_string()));
        }
        if matrix.nrows() != self.n_features() || matrix.ncols() != self.n_samples() {
            return Err(QcError::AssayShape {
                name: name.to_string(),
                rows: matrix.nrows(),
                cols: matrix.ncols(),
                expected_rows: self.n_features(),
                expected_cols: self.n_samples(),
            });
        }
        self.assays.push(Assay {
            name: name.to_string(),
            matrix,
        });
        Ok(())
    }

    /// Look up an assay by name.
    pub fn assay(&self, name: &str) -> Result<&Assay, QcError> {
        self.assays
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| QcError::UnknownAssay(name.to_string()))
    }

    /// True if an assay of this name exists.
    pub fn has_assay(&self, name: &str) -> bool {
        self.assays.iter().any(|a| a.name == name)
    }

    /// Assay names in insertion order.
    pub fn assay_names(&self) -> Vec<&str> {
        self.assays.iter().map(|a| a.name.as_str()).collect()
    }

    /// Per-sample metadata table.
    pub fn sample_meta(&self) -> &MetaTable {
        &self.sample_meta
    }

    /// Mutable per-sample metadata table.
    pub fn sample_meta_mut(&mut self) -> &mut MetaTable {
        &mut self.sample_meta
    }

    /// Per-feature metadata table.
    pub fn feature_meta(&self) -> &MetaTable {
        &self.feature_meta
    }

    /// Mutable per-feature metadata table.
    pub fn feature_meta_mut(&mut self) -> &mut MetaTable {
        &mut self.feature_meta
    }

    /// Subset to the given sample columns, in the given order. Every assay
    /// and the sample metadata table are sliced together.
    ///
    /// Previously computed metric columns are carried over unchanged, not
    /// recomputed; totals in the subset will still reflect the full
    /// container until the metrics are recomputed.
    pub fn select_samples(&self, samples: &[usize]) -> Result<AnnMatrix, QcError> {
        check_indices(samples, self.n_samples(), "sample")?;
        Ok(AnnMatrix {
            feature_ids: self.feature_ids.clone(),
            sample_ids: samples.iter().map(|&i| self.sample_ids[i].clone()).collect(),
            assays: self
                .assays
                .iter()
                .map(|a| Assay {
                    name: a.name.clone(),
                    matrix: a.matrix.select(Axis(1), samples),
                })
                .collect(),
            feature_meta: self.feature_meta.clone(),
            sample_meta: self.sample_meta.select_rows(samples),
        })
    }

    /// Subset to the given feature rows, in the given order. Same staleness
    /// caveat as [`AnnMatrix::select_samples`]; control-set indices held
    /// outside the container are not remapped.
    pub fn select_features(&self, features: &[usize]) -> Result<AnnMatrix, QcError> {
        check_indices(features, self.n_features(), "feature")?;
        Ok(AnnMatrix {
            feature_ids: features.iter().map(|&i| self.feature_ids[i].clone()).collect(),
            sample_ids: self.sample_ids.clone(),
            assays: self
                .assays
                .iter()
                .map(|a| Assay {
                    name: a.name.clone(),
                    matrix: a.matrix.select(Axis(0), features),
                })
                .collect(),
            feature_meta: self.feature_meta.select_rows(features),
            sample_meta: self.sample_meta.clone(),
        })
    }
}

fn check_indices(indices: &[usize], len: usize, axis: &'static str) -> Result<(), QcError> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&bad) => Err(QcError::IndexOutOfBounds {
            axis,
            index: bad,
            len,
        }),
        None => Ok(()),
    }
}
