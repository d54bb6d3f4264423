//! Library-size normalization helpers for count assays.

use ndarray::prelude::*;
use scqc_types::QcError;

/// Per-sample library size factors: column totals scaled to a mean of 1.
///
/// Fails when the matrix has no samples or every library is empty, since
/// no meaningful scaling exists in either case.
pub fn library_size_factors(matrix: &Array2<f64>) -> Result<Array1<f64>, QcError> {
    if matrix.ncols() == 0 {
        return Err(QcError::EmptyInput("matrix has no samples"));
    }
    let totals = matrix.sum_axis(Axis(0));
    let mean = totals.sum() / totals.len() as f64;
    if mean == 0.0 {
        return Err(QcError::EmptyInput("all library sizes are zero"));
    }
    Ok(totals.mapv(|t| t / mean))
}

/// Counts per million: each column scaled so its total is 1e6. Columns with
/// a zero total are left at zero rather than producing NaN.
pub fn cpm(matrix: &Array2<f64>) -> Array2<f64> {
    let totals = matrix.sum_axis(Axis(0));
    let mut out = matrix.to_owned();
    for (mut column, &total) in out.axis_iter_mut(Axis(1)).zip(totals.iter()) {
        if total > 0.0 {
            column.mapv_inplace(|x| 1.0e6 * x / total);
        }
    }
    out
}

/// Average expression per feature after dividing each column by its size
/// factor. With `size_factors = None`, library size factors are used.
/// Columns with a non-positive factor contribute zero.
pub fn calc_average(
    matrix: &Array2<f64>,
    size_factors: Option<&Array1<f64>>,
) -> Result<Array1<f64>, QcError> {
    let factors = match size_factors {
        Some(f) => {
            if f.len() != matrix.ncols() {
                return Err(QcError::DimensionMismatch {
                    name: "size_factors".to_string(),
                    expected: matrix.ncols(),
                    actual: f.len(),
                });
            }
            f.to_owned()
        }
        None => library_size_factors(matrix)?,
    };

    let n = matrix.ncols() as f64;
    let mut acc = Array1::<f64>::zeros(matrix.nrows());
    for (column, &factor) in matrix.axis_iter(Axis(1)).zip(factors.iter()) {
        if factor > 0.0 {
            acc += &column.mapv(|x| x / factor);
        }
    }
    Ok(acc / n)
}
