//! Robust outlier flagging for per-sample QC metric vectors.
//!
//! This is a deterministic predicate over a numeric vector, not a filtering
//! action: it reports which entries *would* be filtered and never removes
//! rows from a container.

use crate::stats::median_abs_deviation;
use anyhow::bail;
use noisy_float::prelude::n64;
use scqc_types::{AnnMatrix, Column, QcError};
use std::str::FromStr;

/// Which side of the center counts as an outlier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutlierSide {
    /// Flag large deviations in both directions
    Both,
    /// Flag only values below the center
    Lower,
    /// Flag only values above the center
    Upper,
}

impl FromStr for OutlierSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(OutlierSide::Both),
            "lower" => Ok(OutlierSide::Lower),
            "upper" => Ok(OutlierSide::Upper),
            _ => bail!("Outlier side not recognized: {}", s),
        }
    }
}

/// Configuration surface for [`flag_outliers`].
#[derive(Clone, Copy, Debug)]
pub struct OutlierConfig {
    /// Apply `x -> log10(1 + x)` before computing center and spread
    pub log_transform: bool,
    /// Number of scaled MADs beyond which a value is an outlier
    pub mad_threshold: f64,
    /// Direction of deviations to flag
    pub side: OutlierSide,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        OutlierConfig {
            log_transform: false,
            mad_threshold: 5.0,
            side: OutlierSide::Both,
        }
    }
}

/// Outcome of an outlier scan: one flag per input value plus the robust
/// location and scale the decision was based on.
#[derive(Clone, Debug)]
pub struct OutlierFlags {
    /// `true` where the value would be filtered
    pub flags: Vec<bool>,
    /// Median of the (optionally log-transformed) values
    pub center: f64,
    /// Median absolute deviation scaled by [`crate::stats::MAD_CONSISTENCY`]
    pub spread: f64,
}

/// Flag entries of `values` deviating from the median by more than
/// `mad_threshold` scaled median absolute deviations.
///
/// When the spread is zero (all values identical) nothing is flagged,
/// regardless of the threshold. Values must be finite.
pub fn flag_outliers(values: &[f64], config: &OutlierConfig) -> Result<OutlierFlags, QcError> {
    if values.is_empty() {
        return Err(QcError::EmptyInput("outlier input vector"));
    }
    if !config.mad_threshold.is_finite() || config.mad_threshold < 0.0 {
        return Err(QcError::InvalidThreshold(config.mad_threshold));
    }

    let transformed = if config.log_transform {
        values.iter().map(|&x| (x + 1.0).log10()).collect::<Vec<_>>()
    } else {
        values.to_vec()
    };

    let mut sorted = transformed.iter().map(|&x| n64(x)).collect::<Vec<_>>();
    let (center, spread) =
        median_abs_deviation(&mut sorted).map_err(|_| QcError::EmptyInput("outlier input vector"))?;

    let limit = config.mad_threshold * spread;
    let flags = transformed
        .iter()
        .map(|&x| {
            if spread == 0.0 {
                return false;
            }
            let deviation = x - center;
            match config.side {
                OutlierSide::Both => deviation.abs() > limit,
                OutlierSide::Lower => -deviation > limit,
                OutlierSide::Upper => deviation > limit,
            }
        })
        .collect();

    Ok(OutlierFlags {
        flags,
        center,
        spread,
    })
}

/// Flag outliers of a numeric per-sample metadata column and write the
/// boolean result back as `out_column` (e.g. `filter_on_total_counts`).
///
/// Returns the diagnostics; container rows are never removed.
pub fn flag_column_outliers(
    mat: &mut AnnMatrix,
    column: &str,
    config: &OutlierConfig,
    out_column: &str,
) -> Result<OutlierFlags, QcError> {
    let col = mat
        .sample_meta()
        .column(column)
        .ok_or_else(|| QcError::UnknownColumn(column.to_string()))?;
    let values = col
        .as_f64()
        .ok_or_else(|| QcError::NonNumericColumn(column.to_string()))?;
    let out = flag_outliers(&values, config)?;
    mat.sample_meta_mut()
        .set_column(out_column, Column::Bool(out.flags.clone()))?;
    Ok(out)
}

#[cfg(test)]
mod test_outliers {
    use super::*;
    use crate::stats::MAD_CONSISTENCY;
    use assert_approx_eq::assert_approx_eq;
    use ndarray::prelude::*;
    use scqc_types::AnnMatrix;

    #[test]
    fn test_zero_spread_short_circuit() {
        // constant vector: spread is exactly zero, nothing flagged
        let out = flag_outliers(&[5.0, 5.0, 5.0, 5.0], &OutlierConfig::default()).unwrap();
        assert_eq!(out.spread, 0.0);
        assert_eq!(out.flags, vec![false; 4]);

        // MAD is still zero with a single extreme value, so nothing is
        // flagged even at the default threshold
        let out = flag_outliers(&[1.0, 1.0, 1.0, 1.0, 100.0], &OutlierConfig::default()).unwrap();
        assert_eq!(out.spread, 0.0);
        assert_eq!(out.flags, vec![false; 5]);
    }

    #[test]
    fn test_flags_extreme_value() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let out = flag_outliers(&values, &OutlierConfig::default()).unwrap();
        assert_eq!(out.center, 3.5);
        assert_approx_eq!(out.spread, 1.5 * MAD_CONSISTENCY, 1e-12);
        assert_eq!(out.flags, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn test_one_sided() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let config = OutlierConfig {
            side: OutlierSide::Lower,
            ..Default::default()
        };
        let out = flag_outliers(&values, &config).unwrap();
        assert_eq!(out.flags, vec![false; 6]);

        let config = OutlierConfig {
            side: OutlierSide::Upper,
            ..Default::default()
        };
        let out = flag_outliers(&values, &config).unwrap();
        assert_eq!(out.flags, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn test_log_transform() {
        // log10(1 + x) gives [1, 2, 3, 4, 7]: center 3, MAD 1
        let values = [9.0, 99.0, 999.0, 9999.0, 1.0e7 - 1.0];
        let config = OutlierConfig {
            log_transform: true,
            mad_threshold: 2.0,
            side: OutlierSide::Both,
        };
        let out = flag_outliers(&values, &config).unwrap();
        assert_eq!(out.center, 3.0);
        assert_approx_eq!(out.spread, MAD_CONSISTENCY, 1e-9);
        // |7 - 3| = 4 > 2 * 1.4826; all others are within the limit
        assert_eq!(out.flags, vec![false, false, false, false, true]);
    }

    #[test]
    fn test_error_conditions() {
        let err = flag_outliers(&[], &OutlierConfig::default()).unwrap_err();
        assert_eq!(err, QcError::EmptyInput("outlier input vector"));

        let config = OutlierConfig {
            mad_threshold: -1.0,
            ..Default::default()
        };
        let err = flag_outliers(&[1.0, 2.0], &config).unwrap_err();
        assert_eq!(err, QcError::InvalidThreshold(-1.0));
    }

    #[test]
    fn test_side_from_str() {
        assert_eq!("both".parse::<OutlierSide>().unwrap(), OutlierSide::Both);
        assert_eq!("lower".parse::<OutlierSide>().unwrap(), OutlierSide::Lower);
        assert_eq!("upper".parse::<OutlierSide>().unwrap(), OutlierSide::Upper);
        assert!("sideways".parse::<OutlierSide>().is_err());
    }

    #[test]
    fn test_flag_column_outliers() {
        let counts = array![[1.0, 2.0, 1.0, 3.0, 2.0, 100.0]];
        let feature_ids = vec!["g0".to_string()];
        let sample_ids = (0..6).map(|i| format!("c{i}")).collect();
        let mut mat = AnnMatrix::new("counts", counts, feature_ids, sample_ids).unwrap();
        mat.sample_meta_mut()
            .set_column("total_counts", Column::F64(vec![1.0, 2.0, 1.0, 3.0, 2.0, 100.0]))
            .unwrap();

        let out = flag_column_outliers(
            &mut mat,
            "total_counts",
            &OutlierConfig::default(),
            "filter_on_total_counts",
        )
        .unwrap();
        assert_eq!(out.center, 2.0);
        let flags = mat
            .sample_meta()
            .column("filter_on_total_counts")
            .unwrap()
            .as_bool()
            .unwrap();
        assert_eq!(flags, &[false, false, false, false, false, true]);

        let err =
            flag_column_outliers(&mut mat, "nope", &OutlierConfig::default(), "out").unwrap_err();
        assert_eq!(err, QcError::UnknownColumn("nope".to_string()));
    }
}
