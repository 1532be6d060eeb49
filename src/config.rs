/*!
Pipeline configuration
*/
use crate::data::scale::FitScope;
use crate::model::TrainConfig;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// The shape of the recurrent network
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// The size of each hidden LSTM layer
    pub hidden: usize,
    /// The number of stacked LSTM layers
    pub layers: usize,
    /// The size of the dense layer between the LSTM and the output
    pub dense: usize,
}

impl Default for ModelConfig {
    fn default() -> ModelConfig {
        ModelConfig {
            hidden: 50,
            layers: 2,
            dense: 25,
        }
    }
}

/// Everything a forecasting run needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// The ticker to forecast
    pub ticker: String,
    /// The first day of history
    pub start: NaiveDate,
    /// The day after the last day of history
    pub end: NaiveDate,
    /// The number of past closes fed to the model per prediction
    pub window: usize,
    /// The share of the series held for training
    pub train_ratio: f64,
    /// Which part of the series the scaler is fit over
    pub fit_scope: FitScope,
    /// Training parameters
    pub train: TrainConfig,
    /// Network shape
    pub model: ModelConfig,
}

impl Default for PipelineConfig {
    fn default() -> PipelineConfig {
        PipelineConfig {
            ticker: "PBR".into(),
            start: NaiveDate::from_ymd(2014, 1, 1),
            end: NaiveDate::from_ymd(2024, 11, 11),
            window: 60,
            train_ratio: 0.8,
            fit_scope: FitScope::FullSeries,
            train: TrainConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from JSON. Missing fields take their default values.
    pub fn from_json_reader<R: Read>(rdr: R) -> Result<PipelineConfig> {
        let config: PipelineConfig = serde_json::from_reader(rdr)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if self.window == 0 {
            return Err(Error::InvalidConfig("window length must be positive".into()));
        }
        if !(self.train_ratio > 0.0 && self.train_ratio <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "training ratio {} is not in (0, 1]",
                self.train_ratio
            )));
        }
        if self.start >= self.end {
            return Err(Error::InvalidConfig(format!(
                "start date {} is not before end date {}",
                self.start, self.end
            )));
        }
        if self.model.hidden == 0 || self.model.layers == 0 || self.model.dense == 0 {
            return Err(Error::InvalidConfig(format!(
                "model layers must be non-empty: {:?}",
                self.model
            )));
        }
        self.train.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{
            "ticker": "VALE",
            "start": "2018-01-01",
            "fit_scope": "training_only",
            "train": { "epochs": 5, "seed": 3 }
        }"#;
        let config = PipelineConfig::from_json_reader(json.as_bytes()).unwrap();
        assert_eq!(config.ticker, "VALE");
        assert_eq!(config.start, NaiveDate::from_ymd(2018, 1, 1));
        assert_eq!(config.end, NaiveDate::from_ymd(2024, 11, 11));
        assert_eq!(config.window, 60);
        assert_eq!(config.fit_scope, FitScope::TrainingOnly);
        assert_eq!(config.train.epochs, 5);
        assert_eq!(config.train.batch_size, 1);
        assert_eq!(config.train.seed, Some(3));
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(PipelineConfig::default().validate().is_ok());
        let bad = [
            PipelineConfig {
                window: 0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                train_ratio: 0.0,
                ..PipelineConfig::default()
            },
            PipelineConfig {
                end: NaiveDate::from_ymd(2014, 1, 1),
                ..PipelineConfig::default()
            },
        ];
        for config in bad.iter() {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
        assert!(PipelineConfig::from_json_reader(r#"{"train":{"epochs":0}}"#.as_bytes()).is_err());
    }
}
