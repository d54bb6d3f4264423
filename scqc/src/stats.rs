//! Statistics functions

use ndarray_stats::errors::QuantileError;
use noisy_float::prelude::n64;
use noisy_float::types::N64;
use num_traits::FromPrimitive;
use std::ops::{Add, Div};

/// Scales a median absolute deviation into a consistent estimator of the
/// standard deviation under normality.
pub const MAD_CONSISTENCY: f64 = 1.4826;

/// Return the median. Sorts its argument in place.
///
/// Works on a plain slice so the sort never has to worry about
/// non-contiguous data; float data should be wrapped in `N64` for the `Ord`
/// bound.
pub fn median_mut<T>(xs: &mut [T]) -> Result<T, QuantileError>
where
    T: Copy + Ord + FromPrimitive + Add<Output = T> + Div<Output = T>,
{
    if xs.is_empty() {
        return Err(QuantileError::EmptyInput);
    }
    xs.sort_unstable();
    let n = xs.len();
    Ok(if n % 2 == 0 {
        (xs[n / 2 - 1] + xs[n / 2]) / T::from_u64(2).unwrap()
    } else {
        xs[n / 2]
    })
}

/// Return `(center, spread)` where `center` is the median of `xs` and
/// `spread` is the median absolute deviation from that center scaled by
/// [`MAD_CONSISTENCY`]. Sorts its argument in place.
pub fn median_abs_deviation(xs: &mut [N64]) -> Result<(f64, f64), QuantileError> {
    let center = median_mut(xs)?.raw();
    let mut deviations = xs
        .iter()
        .map(|x| n64((x.raw() - center).abs()))
        .collect::<Vec<_>>();
    let spread = median_mut(&mut deviations)?.raw() * MAD_CONSISTENCY;
    Ok((center, spread))
}

#[cfg(test)]
mod test_stats {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_median_mut() {
        assert_eq!(median_mut(&mut Vec::<usize>::new()), Err(QuantileError::EmptyInput));
        assert_eq!(median_mut(&mut [1]), Ok(1));
        assert_eq!(median_mut(&mut [10, 1]), Ok(5));
        assert_eq!(median_mut(&mut [100, 1, 10]), Ok(10));
        assert_eq!(median_mut(&mut [1000, 1, 100, 10]), Ok(55));

        let mut xs = [1.0, 10.0].map(n64);
        assert_eq!(median_mut(&mut xs), Ok(n64(5.5)));
        let mut xs = [100.0, 1.0, 10.0].map(n64);
        assert_eq!(median_mut(&mut xs), Ok(n64(10.0)));
    }

    #[test]
    fn test_median_abs_deviation() {
        let mut xs = [1.0, 2.0, 3.0, 4.0, 5.0].map(n64);
        let (center, spread) = median_abs_deviation(&mut xs).unwrap();
        assert_eq!(center, 3.0);
        assert_approx_eq!(spread, MAD_CONSISTENCY, 1e-12);
    }

    #[test]
    fn test_constant_vector_has_zero_spread() {
        let mut xs = [5.0, 5.0, 5.0, 5.0].map(n64);
        let (center, spread) = median_abs_deviation(&mut xs).unwrap();
        assert_eq!(center, 5.0);
        assert_eq!(spread, 0.0);
    }

    #[test]
    fn test_single_extreme_value_does_not_move_mad() {
        // one outlier among identical values leaves the MAD at zero
        let mut xs = [1.0, 1.0, 1.0, 1.0, 100.0].map(n64);
        let (center, spread) = median_abs_deviation(&mut xs).unwrap();
        assert_eq!(center, 1.0);
        assert_eq!(spread, 0.0);
    }
}
