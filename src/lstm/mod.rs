/*!
The LSTM forecaster: two stacked LSTM layers read a window of scaled closes, and two linear layers turn the
last hidden state into the next close
*/

use crate::config::ModelConfig;
use crate::data::window::Window;
use crate::model::{Forecaster, TrainConfig, TrainSummary};
use crate::util::to_gpu;
use crate::{Error, GpuFloat, Result};
use std::convert::TryFrom;
use tch::nn::{self, Linear, Module, OptimizerConfig, RNNConfig, VarStore, LSTM, RNN};
use tch::{Device, Kind, Reduction, Tensor};

/// The number of windows predicted per forward pass
const PREDICT_BATCH: usize = 256;

/// The CloseLSTM network
#[derive(Debug)]
pub struct CloseLSTM {
    /// This model's stacked LSTM layers
    pub lstm_layer: LSTM,
    /// The dense layer reading the last hidden state
    pub dense_layer: Linear,
    /// The output layer
    pub output_layer: Linear,
}

impl CloseLSTM {
    /// Map a `[batch, window, 1]` input to `[batch, 1]` predictions
    pub fn forward(&self, xs: &Tensor) -> Tensor {
        let (hidden, _state) = self.lstm_layer.seq(xs);
        let last = hidden.select(1, -1);
        self.output_layer.forward(&self.dense_layer.forward(&last))
    }

    /// Compute the mean squared error of the predictions for `xs` against `ys`
    pub fn loss(&self, xs: &Tensor, ys: &Tensor) -> Tensor {
        self.forward(xs).mse_loss(ys, Reduction::Mean)
    }

    /// Package the given rows of a set of windows into an input tensor of shape `[rows, window, 1]` and a
    /// target tensor of shape `[rows, 1]`
    pub fn make_batch(windows: &[Window], rows: &[usize]) -> Result<(Tensor, Tensor)> {
        let window = match rows.first() {
            Some(&row) => windows[row].input.len(),
            None => return Err(Error::EmptyInput("batch")),
        };
        let mut input = Vec::<GpuFloat>::with_capacity(rows.len() * window);
        let mut output = Vec::<GpuFloat>::with_capacity(rows.len());
        for &row in rows {
            let w = &windows[row];
            if w.input.len() != window {
                return Err(Error::InvalidConfig(format!(
                    "window for target {} has length {}, expected {}",
                    w.target_index,
                    w.input.len(),
                    window
                )));
            }
            input.extend(to_gpu(w.input));
            output.extend(to_gpu(&[w.target]));
        }
        let input = Tensor::from_slice(&input).view([rows.len() as i64, window as i64, 1]);
        let output = Tensor::from_slice(&output).view([rows.len() as i64, 1]);
        Ok((input, output))
    }
}

/// A descriptor for an instance of the CloseLSTM model
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct CloseLSTMDesc {
    /// The size of the hidden LSTM layers to use
    pub hidden: usize,
    /// The number of hidden LSTM layers to use
    pub layers: usize,
    /// The size of the dense layer
    pub dense: usize,
}

impl From<&ModelConfig> for CloseLSTMDesc {
    fn from(config: &ModelConfig) -> CloseLSTMDesc {
        CloseLSTMDesc {
            hidden: config.hidden,
            layers: config.layers,
            dense: config.dense,
        }
    }
}

impl CloseLSTMDesc {
    /// Build a `CloseLSTM` over a given `VarStore `
    pub fn build(&self, vs: &VarStore) -> CloseLSTM {
        let root = vs.root();
        let lstm_path = &root / "lstm";
        let dense_path = &root / "dense";
        let output_path = &root / "output";
        let lstm_layer = nn::lstm(
            &lstm_path,
            1,
            self.hidden as i64,
            RNNConfig {
                has_biases: true,
                num_layers: self.layers as i64,
                dropout: 0.,
                train: true,
                bidirectional: false,
                batch_first: true,
            },
        );
        let dense_layer = nn::linear(
            &dense_path,
            self.hidden as i64,
            self.dense as i64,
            Default::default(),
        );
        let output_layer = nn::linear(&output_path, self.dense as i64, 1, Default::default());
        CloseLSTM {
            lstm_layer,
            dense_layer,
            output_layer,
        }
    }
}

/// Progress through a training run, reported after every optimizer step
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BatchProgress {
    /// The current epoch, from zero
    pub epoch: usize,
    /// The batch within the epoch, from zero
    pub batch: usize,
    /// The number of batches per epoch
    pub batches: usize,
    /// This batch's loss
    pub loss: f64,
}

impl BatchProgress {
    /// Whether this is the last batch of its epoch
    #[inline]
    pub fn ends_epoch(&self) -> bool {
        self.batch + 1 == self.batches
    }
}

/// A trainable CloseLSTM together with its weights and training parameters
#[derive(Debug)]
pub struct LstmForecaster {
    /// The weights
    pub vs: VarStore,
    /// The network
    pub net: CloseLSTM,
    /// Training parameters
    pub train: TrainConfig,
    /// The device tensors are sent to
    pub device: Device,
}

/// Build an untrained LSTM forecaster
pub fn build_model(desc: &CloseLSTMDesc, train: TrainConfig, device: Device) -> Result<LstmForecaster> {
    train.validate()?;
    if let Some(seed) = train.seed {
        tch::manual_seed(seed as i64);
    }
    let vs = VarStore::new(device);
    let net = desc.build(&vs);
    Ok(LstmForecaster {
        vs,
        net,
        train,
        device,
    })
}

impl LstmForecaster {
    /// Train, calling `observer` after every optimizer step
    pub fn fit_observed<O>(&mut self, windows: &[Window], mut observer: O) -> Result<TrainSummary>
    where
        O: FnMut(BatchProgress),
    {
        if windows.is_empty() {
            return Err(Error::EmptyInput("training set"));
        }
        let mut opt = nn::Adam::default().build(&self.vs, self.train.learning_rate)?;
        let batches = (windows.len() + self.train.batch_size - 1) / self.train.batch_size;
        let mut summary = TrainSummary::default();
        let mut total_loss = 0.0;
        for (epoch, order) in self.train.epoch_orders(windows.len()).iter().enumerate() {
            let mut epoch_loss = 0.0;
            for (batch, rows) in order.chunks(self.train.batch_size).enumerate() {
                let (xs, ys) = CloseLSTM::make_batch(windows, rows)?;
                let loss = self
                    .net
                    .loss(&xs.to_device(self.device), &ys.to_device(self.device));
                opt.backward_step(&loss);
                let loss = loss.double_value(&[]);
                epoch_loss += loss;
                observer(BatchProgress {
                    epoch,
                    batch,
                    batches,
                    loss,
                });
            }
            total_loss += epoch_loss;
            summary.epochs += 1;
            summary.batches += batches;
            summary.final_loss = epoch_loss / batches as f64;
            log::debug!("epoch {}: mean loss {:.6}", epoch, summary.final_loss);
        }
        summary.mean_loss = total_loss / summary.batches as f64;
        Ok(summary)
    }
}

impl Forecaster for LstmForecaster {
    fn fit(&mut self, windows: &[Window]) -> Result<TrainSummary> {
        self.fit_observed(windows, |_| {})
    }

    fn predict(&self, windows: &[Window]) -> Result<Vec<f64>> {
        let rows: Vec<usize> = (0..windows.len()).collect();
        let mut predictions = Vec::with_capacity(windows.len());
        for rows in rows.chunks(PREDICT_BATCH) {
            let (xs, _) = CloseLSTM::make_batch(windows, rows)?;
            let out = tch::no_grad(|| self.net.forward(&xs.to_device(self.device)));
            let out = out
                .flatten(0, -1)
                .to_kind(Kind::Float)
                .to_device(Device::Cpu);
            let out = Vec::<GpuFloat>::try_from(&out)?;
            predictions.extend(out.into_iter().map(f64::from));
        }
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::window::build_windows;

    /// Test making batches of data
    #[test]
    fn batch_making_works() {
        let series: Vec<f64> = (0..20).map(|v| v as f64 / 20.0).collect();
        let dataset = build_windows(&series, 5, 15).unwrap();
        let (input, output) = CloseLSTM::make_batch(&dataset.train, &[3, 0, 7]).unwrap();
        assert_eq!(input.size3().unwrap(), (3, 5, 1));
        assert_eq!(output.size2().unwrap(), (3, 1));
        let targets = Vec::<GpuFloat>::try_from(&output.flatten(0, -1)).unwrap();
        assert_eq!(targets, vec![0.4, 0.25, 0.6]);
        assert!(CloseLSTM::make_batch(&dataset.train, &[]).is_err());
    }

    #[test]
    fn trains_and_predicts_in_order() {
        let series: Vec<f64> = (0..120)
            .map(|i| 0.5 + 0.4 * (i as f64 / 8.0).sin())
            .collect();
        let dataset = build_windows(&series, 10, 96).unwrap();
        let train = TrainConfig {
            epochs: 2,
            batch_size: 8,
            learning_rate: 0.01,
            shuffle: true,
            seed: Some(1),
        };
        let desc = CloseLSTMDesc {
            hidden: 8,
            layers: 2,
            dense: 4,
        };
        let mut model = build_model(&desc, train, Device::Cpu).unwrap();
        let mut steps = 0;
        let mut epoch_ends = Vec::new();
        let summary = model
            .fit_observed(&dataset.train, |progress| {
                steps += 1;
                if progress.ends_epoch() {
                    epoch_ends.push(progress.epoch);
                }
            })
            .unwrap();
        assert_eq!(summary.epochs, 2);
        assert_eq!(summary.batches, 2 * 11);
        assert_eq!(steps, 22);
        assert_eq!(epoch_ends, vec![0, 1]);
        assert!(summary.final_loss.is_finite());
        let predictions = model.predict(&dataset.eval).unwrap();
        assert_eq!(predictions.len(), dataset.eval.len());
        assert!(predictions.iter().all(|p| p.is_finite()));
        let empty: &[Window] = &[];
        assert!(matches!(model.fit(empty), Err(Error::EmptyInput(_))));
    }
}
