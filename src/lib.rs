/*!
One-step-ahead forecasting of a stock's daily closing price, written in Rust as an experiment.

Daily history is pulled from [Yahoo Finance](https://finance.yahoo.com/) (or a CSV file in the same
format), the closes are min-max scaled, cut into fixed-length windows, and fed to a small stacked
LSTM running on PyTorch bindings. The held-out tail is then predicted, unscaled and scored by RMSE.
*/
#![forbid(missing_docs)]

pub mod config;
pub mod data;
pub mod error;
pub mod eval;
#[cfg(feature = "lstm")]
pub mod lstm;
pub mod model;
pub mod pipeline;
pub mod util;

pub use error::{Error, Result};

/// The floating point type to be used for CPU calculations
pub type CpuFloat = f64;

/// The floating point type to be used for GPU calculations
pub type GpuFloat = f32;
