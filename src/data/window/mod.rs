/*!
Cutting a scaled series into fixed-length input windows, each labelled with the value that follows it.

For a series `S` of length `n`, window length `w` and split boundary `b`, the training windows are
`(S[i-w..i], S[i])` for `i` in `[w, b)` and the evaluation windows the same for `i` in `[b, n)`.
An evaluation window's input may reach back past `b`, but its target never does.
*/
use crate::{CpuFloat, Error, Result};
use std::ops::Range;

/// The split boundary for a series of `len` observations: `ceil(train_ratio * len)`
pub fn split_boundary(len: usize, train_ratio: f64) -> Result<usize> {
    if !(train_ratio > 0.0 && train_ratio <= 1.0) {
        return Err(Error::InvalidConfig(format!(
            "training ratio {} is not in (0, 1]",
            train_ratio
        )));
    }
    Ok(((len as f64 * train_ratio).ceil() as usize).min(len))
}

/// An input window and its target
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Window<'a, F = CpuFloat> {
    /// The `w` values preceding the target
    pub input: &'a [F],
    /// The value immediately following the input
    pub target: F,
    /// The index of the target in the series. Always `input`'s start index plus its length.
    pub target_index: usize,
}

impl<'a, F> Window<'a, F> {
    /// The index of the first input value in the series
    #[inline]
    pub fn start(&self) -> usize {
        self.target_index - self.input.len()
    }
}

/// A series cut into training and evaluation windows
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedDataset<'a, F = CpuFloat> {
    /// The window length
    pub window: usize,
    /// The split boundary: every training target lies before it, every evaluation target at or after it
    pub boundary: usize,
    /// The training windows, in ascending target order
    pub train: Vec<Window<'a, F>>,
    /// The evaluation windows, in ascending target order
    pub eval: Vec<Window<'a, F>>,
}

impl<'a, F> WindowedDataset<'a, F> {
    /// The target indices of the training windows
    pub fn train_target_indices(&self) -> Range<usize> {
        self.window..self.boundary
    }

    /// The target indices of the evaluation windows
    pub fn eval_target_indices(&self) -> Range<usize> {
        let end = self.eval.last().map_or(self.boundary, |w| w.target_index + 1);
        self.boundary..end
    }

    /// The total number of windows
    pub fn len(&self) -> usize {
        self.train.len() + self.eval.len()
    }

    /// Whether there are no windows at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cut `series` into windows of length `window`, split at `boundary`.
///
/// A boundary past the end of the series is clamped to its length, leaving no evaluation windows.
pub fn build_windows<F: Copy>(
    series: &[F],
    window: usize,
    boundary: usize,
) -> Result<WindowedDataset<'_, F>> {
    if window == 0 {
        return Err(Error::InvalidConfig("window length must be positive".into()));
    }
    let len = series.len();
    if len < window + 1 || boundary < window {
        return Err(Error::InsufficientData {
            len,
            window,
            boundary,
        });
    }
    let boundary = boundary.min(len);
    let make = |i: usize| Window {
        input: &series[i - window..i],
        target: series[i],
        target_index: i,
    };
    let train: Vec<_> = (window..boundary).map(make).collect();
    let eval: Vec<_> = (boundary..len).map(make).collect();
    log::debug!(
        "built {} training and {} evaluation windows of length {} from {} values",
        train.len(),
        eval.len(),
        window,
        len
    );
    Ok(WindowedDataset {
        window,
        boundary,
        train,
        eval,
    })
}
