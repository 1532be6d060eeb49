/*!
Errors raised anywhere in the forecasting pipeline. All of them are fatal: nothing retries.
*/
use thiserror::Error;

/// A `closeburn` error
#[derive(Debug, Error)]
pub enum Error {
    /// The data source returned nothing usable
    #[error("no data available for {ticker:?}: {reason}")]
    DataUnavailable {
        /// The requested ticker
        ticker: String,
        /// What went wrong
        reason: String,
    },
    /// Every value of the series is identical, so it cannot be range-scaled
    #[error("cannot scale a degenerate series of {len} values all equal to {value}")]
    DegenerateSeries {
        /// The length of the series
        len: usize,
        /// The single value taken by the series
        value: f64,
    },
    /// Too few observations to form the requested windows
    #[error("insufficient data: {len} observations, window length {window}, split boundary {boundary}")]
    InsufficientData {
        /// The length of the series
        len: usize,
        /// The window length
        window: usize,
        /// The train/evaluation split boundary
        boundary: usize,
    },
    /// The model returned a different number of predictions than there are targets
    #[error("got {predictions} predictions for {targets} evaluation targets")]
    ShapeMismatch {
        /// The number of predictions
        predictions: usize,
        /// The number of targets
        targets: usize,
    },
    /// A price series violates ordering or finiteness
    #[error("invalid price series at index {index}: {reason}")]
    InvalidSeries {
        /// The offending index
        index: usize,
        /// What is wrong with it
        reason: String,
    },
    /// An operation was handed nothing to work on
    #[error("{0} is empty")]
    EmptyInput(&'static str),
    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A CSV error
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// An HTTP transport error
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// A JSON error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// A libtorch error
    #[cfg(feature = "lstm")]
    #[error(transparent)]
    Torch(#[from] tch::TchError),
}

/// A `Result` carrying a `closeburn` error
pub type Result<T> = std::result::Result<T, Error>;
