//! Per-sample and per-feature QC metric computation.
//!
//! [`compute_qc_metrics`] walks one or more assays of an [`AnnMatrix`] and
//! merges summary columns into its metadata tables: totals, detection
//! counts, and the share of signal attributable to named control sets.
//! Validation happens up front and columns are staged before any merge, so
//! a failed call never leaves a half-written table behind.

use itertools::izip;
use log::info;
use ndarray::prelude::*;
use scqc_types::controls::mask;
use scqc_types::{AnnMatrix, Column, ControlSets, QcError};

/// Assay used for detection calls when none is configured.
pub const DEFAULT_DETECTION_ASSAY: &str = "counts";

/// Configuration surface for [`compute_qc_metrics`].
#[derive(Clone, Debug)]
pub struct QcConfig {
    /// Assay the metrics are primarily computed on
    pub detection_assay: String,
    /// Exclusive threshold above which an entry counts as detected
    pub detection_threshold: f64,
    /// Named feature subsets treated as technical controls (e.g. spike-ins)
    pub feature_controls: ControlSets,
    /// Named sample subsets treated as technical controls (e.g. blank wells)
    pub sample_controls: ControlSets,
    /// Further assays to compute the same metrics for, so that e.g.
    /// `total_counts` and `total_tpm` both exist. Empty means the detection
    /// assay only.
    pub compute_for_assays: Vec<String>,
}

impl Default for QcConfig {
    fn default() -> Self {
        QcConfig {
            detection_assay: DEFAULT_DETECTION_ASSAY.to_string(),
            detection_threshold: 0.0,
            feature_controls: ControlSets::new(),
            sample_controls: ControlSets::new(),
            compute_for_assays: Vec::new(),
        }
    }
}

/// Compute QC metric columns and merge them into the metadata tables of
/// `mat`. Pre-existing columns with colliding names are overwritten; no
/// other state is touched. The call is idempotent.
pub fn compute_qc_metrics(mat: &mut AnnMatrix, config: &QcConfig) -> Result<(), QcError> {
    let mut assay_names = vec![config.detection_assay.clone()];
    for name in &config.compute_for_assays {
        if !assay_names.contains(name) {
            assay_names.push(name.clone());
        }
    }

    // eager validation: no column is staged until everything checks out
    for name in &assay_names {
        mat.assay(name)?;
    }
    config.feature_controls.validate(mat.n_features())?;
    config.sample_controls.validate(mat.n_samples())?;

    info!(
        "computing QC metrics on {} x {} container ({} assays)",
        mat.n_features(),
        mat.n_samples(),
        assay_names.len()
    );

    let mut sample_columns: Vec<(String, Column)> = Vec::new();
    let mut feature_columns: Vec<(String, Column)> = Vec::new();

    for name in &assay_names {
        let matrix = &mat.assay(name)?.matrix;
        stage_sample_metrics(matrix, name, config, &mut sample_columns);
        stage_feature_metrics(matrix, name, config, &mut feature_columns);
    }

    stage_membership(
        &config.feature_controls,
        mat.n_features(),
        "is_feature_control",
        &mut feature_columns,
    );
    stage_membership(
        &config.sample_controls,
        mat.n_samples(),
        "is_sample_control",
        &mut sample_columns,
    );

    for (name, column) in sample_columns {
        mat.sample_meta_mut().set_column(&name, column)?;
    }
    for (name, column) in feature_columns {
        mat.feature_meta_mut().set_column(&name, column)?;
    }
    Ok(())
}

/// Totals and detection counts along one axis of an assay.
struct AxisMetrics {
    total: Array1<f64>,
    detected: Array1<i64>,
}

/// Sum and count detections over `axis`, one result per entity of the
/// other axis.
fn axis_metrics(matrix: &ArrayView2<f64>, axis: Axis, threshold: f64) -> AxisMetrics {
    AxisMetrics {
        total: matrix.sum_axis(axis),
        detected: matrix.fold_axis(axis, 0, |&acc, &x| if x > threshold { acc + 1 } else { acc }),
    }
}

fn log10p1(xs: &Array1<f64>) -> Vec<f64> {
    xs.iter().map(|&x| (x + 1.0).log10()).collect()
}

/// `100 * part / whole` per entity, defined as 0 where the whole is 0.
fn percentages(part: &Array1<f64>, whole: &Array1<f64>) -> Vec<f64> {
    izip!(part.iter(), whole.iter())
        .map(|(&p, &w)| if w == 0.0 { 0.0 } else { 100.0 * p / w })
        .collect()
}

fn complement(indices: &[usize], n: usize) -> Vec<usize> {
    let m = mask(indices, n);
    (0..n).filter(|&i| !m[i]).collect()
}

fn stage_total_columns(out: &mut Vec<(String, Column)>, prefix: &str, metrics: &AxisMetrics) {
    out.push((format!("total_{prefix}"), Column::F64(metrics.total.to_vec())));
    out.push((format!("log10_total_{prefix}"), Column::F64(log10p1(&metrics.total))));
    out.push((format!("detected_{prefix}"), Column::Int(metrics.detected.to_vec())));
}

/// Per-sample columns for one assay: whole-assay totals, then totals,
/// detection counts and signal percentages restricted to each named
/// feature-control set, their union (when more than one set exists under
/// the derived name `feature_control`), and the endogenous complement.
fn stage_sample_metrics(
    matrix: &Array2<f64>,
    assay: &str,
    config: &QcConfig,
    out: &mut Vec<(String, Column)>,
) {
    let threshold = config.detection_threshold;
    let whole = axis_metrics(&matrix.view(), Axis(0), threshold);
    stage_total_columns(out, assay, &whole);

    let controls = &config.feature_controls;
    if controls.is_empty() {
        return;
    }

    for (set_name, indices) in controls.iter() {
        let sub = matrix.select(Axis(0), indices);
        let part = axis_metrics(&sub.view(), Axis(0), threshold);
        stage_total_columns(out, &format!("{assay}_{set_name}"), &part);
        out.push((
            format!("pct_{assay}_{set_name}"),
            Column::F64(percentages(&part.total, &whole.total)),
        ));
    }

    let union = controls.union();
    if controls.len() > 1 {
        let sub = matrix.select(Axis(0), &union);
        let part = axis_metrics(&sub.view(), Axis(0), threshold);
        stage_total_columns(out, &format!("{assay}_feature_control"), &part);
        out.push((
            format!("pct_{assay}_feature_control"),
            Column::F64(percentages(&part.total, &whole.total)),
        ));
    }

    let endogenous = complement(&union, matrix.nrows());
    let sub = matrix.select(Axis(0), &endogenous);
    let part = axis_metrics(&sub.view(), Axis(0), threshold);
    stage_total_columns(out, &format!("{assay}_endogenous"), &part);
}

/// Per-feature columns for one assay: means, totals, the share of the
/// grand total, detection counts across samples, and the same figures
/// restricted to each named sample-control set with its union and
/// non-control complement.
fn stage_feature_metrics(
    matrix: &Array2<f64>,
    assay: &str,
    config: &QcConfig,
    out: &mut Vec<(String, Column)>,
) {
    let threshold = config.detection_threshold;
    let whole = axis_metrics(&matrix.view(), Axis(1), threshold);
    let grand_total = whole.total.sum();

    stage_feature_subset_columns(out, assay, &whole, matrix.ncols());
    out.push((
        format!("pct_total_{assay}"),
        Column::F64(percentages(&whole.total, &Array1::from_elem(whole.total.len(), grand_total))),
    ));

    let controls = &config.sample_controls;
    if controls.is_empty() {
        return;
    }

    for (set_name, indices) in controls.iter() {
        let sub = matrix.select(Axis(1), indices);
        let part = axis_metrics(&sub.view(), Axis(1), threshold);
        stage_feature_subset_columns(out, &format!("{assay}_{set_name}"), &part, indices.len());
        out.push((
            format!("pct_{assay}_{set_name}"),
            Column::F64(percentages(&part.total, &whole.total)),
        ));
    }

    let union = controls.union();
    if controls.len() > 1 {
        let sub = matrix.select(Axis(1), &union);
        let part = axis_metrics(&sub.view(), Axis(1), threshold);
        stage_feature_subset_columns(out, &format!("{assay}_sample_control"), &part, union.len());
        out.push((
            format!("pct_{assay}_sample_control"),
            Column::F64(percentages(&part.total, &whole.total)),
        ));
    }

    let non_control = complement(&union, matrix.ncols());
    let sub = matrix.select(Axis(1), &non_control);
    let part = axis_metrics(&sub.view(), Axis(1), threshold);
    stage_feature_subset_columns(out, &format!("{assay}_non_control"), &part, non_control.len());
}

/// Mean, total, log10 total and detected-sample count for one feature-axis
/// subset. `n_samples` is the subset width the mean is taken over.
fn stage_feature_subset_columns(
    out: &mut Vec<(String, Column)>,
    prefix: &str,
    metrics: &AxisMetrics,
    n_samples: usize,
) {
    let mean = if n_samples == 0 {
        vec![0.0; metrics.total.len()]
    } else {
        metrics.total.iter().map(|&t| t / n_samples as f64).collect()
    };
    out.push((format!("mean_{prefix}"), Column::F64(mean)));
    out.push((format!("total_{prefix}"), Column::F64(metrics.total.to_vec())));
    out.push((format!("log10_total_{prefix}"), Column::F64(log10p1(&metrics.total))));
    out.push((
        format!("detected_samples_{prefix}"),
        Column::Int(metrics.detected.to_vec()),
    ));
}

/// Boolean membership columns: one for the union under `union_name`, one
/// per named set as `{union_name}_{set}`.
fn stage_membership(
    controls: &ControlSets,
    n: usize,
    union_name: &str,
    out: &mut Vec<(String, Column)>,
) {
    out.push((union_name.to_string(), Column::Bool(controls.membership(n))));
    for (set_name, indices) in controls.iter() {
        out.push((
            format!("{union_name}_{set_name}"),
            Column::Bool(mask(indices, n)),
        ));
    }
}
