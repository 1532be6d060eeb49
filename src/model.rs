/*!
The boundary between the pipeline and whatever does the forecasting.

Models are plain values owned by the caller: build one, `fit` it on the training windows, then `predict` the
evaluation windows with it.
*/
use crate::data::window::Window;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// The forecaster to use when none is named: the LSTM if it is built in, persistence otherwise
#[cfg(feature = "lstm")]
pub const DEFAULT_FORECASTER: &str = "lstm";
/// The forecaster to use when none is named: the LSTM if it is built in, persistence otherwise
#[cfg(not(feature = "lstm"))]
pub const DEFAULT_FORECASTER: &str = "persistence";

/// How to train a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// The number of passes over the training windows
    pub epochs: usize,
    /// The number of windows per optimizer step
    pub batch_size: usize,
    /// The optimizer's learning rate
    pub learning_rate: f64,
    /// Whether to visit training windows in a random order each epoch
    pub shuffle: bool,
    /// The seed for shuffling. Drawn from entropy if unset.
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> TrainConfig {
        TrainConfig {
            epochs: 1,
            batch_size: 1,
            learning_rate: 0.001,
            shuffle: true,
            seed: None,
        }
    }
}

impl TrainConfig {
    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be positive".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "learning rate {} must be positive",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// The order to visit `len` training rows in, one `Vec` per epoch.
    ///
    /// Only whole rows move: a window always stays paired with its own target.
    pub fn epoch_orders(&self, len: usize) -> Vec<Vec<usize>> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        (0..self.epochs)
            .map(|_| {
                let mut order: Vec<usize> = (0..len).collect();
                if self.shuffle {
                    order.shuffle(&mut rng);
                }
                order
            })
            .collect()
    }
}

/// Loss statistics from a training run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainSummary {
    /// The number of epochs run
    pub epochs: usize,
    /// The number of optimizer steps taken
    pub batches: usize,
    /// The mean batch loss of the last epoch
    pub final_loss: f64,
    /// The mean batch loss over all epochs
    pub mean_loss: f64,
}

/// A one-step-ahead forecaster over scaled windows
pub trait Forecaster {
    /// Train on windows and their targets
    fn fit(&mut self, windows: &[Window]) -> Result<TrainSummary>;
    /// Predict the target of every window, in order
    fn predict(&self, windows: &[Window]) -> Result<Vec<f64>>;
}

/// The naive forecaster: tomorrow's close is today's close
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Persistence;

impl Forecaster for Persistence {
    fn fit(&mut self, windows: &[Window]) -> Result<TrainSummary> {
        let n = windows.len().max(1) as f64;
        let loss = windows
            .iter()
            .map(|w| (w.input.last().copied().unwrap_or(0.0) - w.target).powi(2))
            .sum::<f64>()
            / n;
        Ok(TrainSummary {
            epochs: 0,
            batches: 0,
            final_loss: loss,
            mean_loss: loss,
        })
    }

    fn predict(&self, windows: &[Window]) -> Result<Vec<f64>> {
        windows
            .iter()
            .map(|w| {
                w.input
                    .last()
                    .copied()
                    .ok_or(Error::EmptyInput("persistence input window"))
            })
            .collect()
    }
}
