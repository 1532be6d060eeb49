/*!
Input data scaling
*/
use crate::{CpuFloat, Error, Result};
use itertools::{Itertools, MinMaxResult};
use num::{Float, NumCast};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Which part of the series a scaler is fit over
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitScope {
    /// Fit over the whole series, evaluation range included. Leaks the evaluation range's bounds into training.
    FullSeries,
    /// Fit over the training range only; evaluation values may scale outside the feature range
    TrainingOnly,
}

impl Default for FitScope {
    fn default() -> FitScope {
        FitScope::FullSeries
    }
}

/// An affine scaler mapping `[min, max]` of the data it was fit on onto a feature range `[low, high]`
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MinMaxScaler<F = CpuFloat> {
    /// The smallest value seen during fitting
    pub min: F,
    /// The largest value seen during fitting
    pub max: F,
    /// The value `min` is mapped to
    pub low: F,
    /// The value `max` is mapped to
    pub high: F,
}

impl<F> MinMaxScaler<F>
where
    F: Copy + Float + Debug,
{
    /// Fit a scaler onto `[0, 1]`
    #[inline]
    pub fn fit(values: &[F]) -> Result<MinMaxScaler<F>> {
        Self::fit_range(values, F::zero(), F::one())
    }

    /// Fit a scaler onto `[low, high]`
    pub fn fit_range(values: &[F], low: F, high: F) -> Result<MinMaxScaler<F>> {
        if !(low < high) {
            return Err(Error::InvalidConfig(format!(
                "feature range {:?}..{:?} is empty",
                low, high
            )));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidSeries {
                index,
                reason: "cannot scale a non-finite value".into(),
            });
        }
        let (min, max) = match values.iter().copied().minmax() {
            MinMaxResult::NoElements => return Err(Error::EmptyInput("scaler input")),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        if min == max {
            return Err(Error::DegenerateSeries {
                len: values.len(),
                value: NumCast::from(min).unwrap_or(f64::NAN),
            });
        }
        Ok(MinMaxScaler {
            min,
            max,
            low,
            high,
        })
    }

    /// The `(min, max)` this scaler was fit with
    #[inline]
    pub fn bounds(&self) -> (F, F) {
        (self.min, self.max)
    }

    /// Scale a value. Values outside `[min, max]` are extrapolated, not clipped.
    #[inline]
    pub fn transform(&self, val: F) -> F {
        self.low + (val - self.min) / (self.max - self.min) * (self.high - self.low)
    }

    /// Undo `transform`
    #[inline]
    pub fn inverse(&self, scaled: F) -> F {
        self.min + (scaled - self.low) / (self.high - self.low) * (self.max - self.min)
    }

    /// Scale every value of a slice
    pub fn transform_all(&self, values: &[F]) -> Vec<F> {
        values.iter().map(|v| self.transform(*v)).collect()
    }

    /// Unscale every value of a slice
    pub fn inverse_all(&self, scaled: &[F]) -> Vec<F> {
        scaled.iter().map(|v| self.inverse(*v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bounds_map_to_feature_range() {
        let closes = [14.2, 9.8, 31.7, 22.0, 17.5];
        let scaler = MinMaxScaler::fit(&closes).unwrap();
        assert_eq!(scaler.bounds(), (9.8, 31.7));
        assert_eq!(scaler.transform(9.8), 0.0);
        assert_eq!(scaler.transform(31.7), 1.0);
        for scaled in scaler.transform_all(&closes) {
            assert!((0.0..=1.0).contains(&scaled));
        }
    }

    #[test]
    fn inverse_undoes_transform() {
        let closes = [14.2, 9.8, 31.7, 22.0, 17.5];
        let scaler = MinMaxScaler::fit(&closes).unwrap();
        for close in closes.iter() {
            assert_relative_eq!(scaler.inverse(scaler.transform(*close)), *close, epsilon = 1e-12);
        }
        let wide = MinMaxScaler::fit_range(&closes[..], -1.0, 1.0).unwrap();
        assert_eq!(wide.transform(9.8), -1.0);
        assert_eq!(wide.transform(31.7), 1.0);
        assert_relative_eq!(wide.inverse(wide.transform(17.5)), 17.5, epsilon = 1e-12);
    }

    #[test]
    fn out_of_range_values_extrapolate() {
        let scaler = MinMaxScaler::fit(&[10.0, 20.0]).unwrap();
        assert_relative_eq!(scaler.transform(25.0), 1.5);
        assert_relative_eq!(scaler.transform(5.0), -0.5);
        assert_relative_eq!(scaler.inverse(1.5), 25.0);
    }

    #[test]
    fn degenerate_series_is_an_error() {
        match MinMaxScaler::fit(&[3.5, 3.5, 3.5]) {
            Err(Error::DegenerateSeries { len: 3, value }) => assert_eq!(value, 3.5),
            other => panic!("expected degenerate series, got {:?}", other),
        }
        assert!(MinMaxScaler::fit(&[7.0f32]).is_err());
    }

    #[test]
    fn empty_and_non_finite_input() {
        assert!(matches!(
            MinMaxScaler::<f64>::fit(&[]),
            Err(Error::EmptyInput(_))
        ));
        assert!(matches!(
            MinMaxScaler::fit(&[1.0, f64::INFINITY]),
            Err(Error::InvalidSeries { index: 1, .. })
        ));
        assert!(MinMaxScaler::fit_range(&[1.0, 2.0], 1.0, 1.0).is_err());
    }
}
