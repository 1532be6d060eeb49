/*!
The forecasting run, from a price series to a report.

The stages run strictly in order and the first failure aborts the run:
boundary, scaler fit, windowing, training, prediction, unscaling, scoring.
*/
use crate::config::PipelineConfig;
use crate::data::scale::{FitScope, MinMaxScaler};
use crate::data::window::{build_windows, split_boundary};
use crate::data::PriceSeries;
use crate::eval::{evaluate, Evaluation, Summary};
use crate::model::{Forecaster, TrainSummary};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::{self, Display};
use std::io::Write;

/// One held-out day: the true close and the model's prediction for it
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ValidationRow {
    /// The trading date
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// The true closing price
    #[serde(rename = "Close")]
    pub close: f64,
    /// The predicted closing price
    #[serde(rename = "Predictions")]
    pub prediction: f64,
}

/// The outcome of a forecasting run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// The ticker forecast
    pub ticker: String,
    /// The number of trading days in the series
    pub len: usize,
    /// The window length
    pub window: usize,
    /// The train/evaluation split boundary
    pub boundary: usize,
    /// The `(min, max)` the scaler was fit with
    pub scaler_bounds: (f64, f64),
    /// Training loss statistics
    pub training: TrainSummary,
    /// Evaluation metrics
    pub evaluation: Evaluation,
    /// The held-out days with their predictions
    pub validation: Vec<ValidationRow>,
    /// Statistics of the held-out closes
    pub truth_summary: Summary,
    /// Statistics of the predictions
    pub prediction_summary: Summary,
}

impl Report {
    /// Write the held-out days as CSV with a `Date,Close,Predictions` header.
    /// On success, return how many rows were written.
    pub fn write_validation_csv<W: Write>(&self, wtr: W) -> Result<usize> {
        let mut wtr = csv::Writer::from_writer(wtr);
        for row in &self.validation {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(self.validation.len())
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{}: {} trading days, {} for training, window {}",
            self.ticker, self.len, self.boundary, self.window
        )?;
        writeln!(
            f,
            "Scaler fit on [{:.4}, {:.4}]",
            self.scaler_bounds.0, self.scaler_bounds.1
        )?;
        writeln!(
            f,
            "Training: {} epochs, {} batches, final loss {:.6}",
            self.training.epochs, self.training.batches, self.training.final_loss
        )?;
        writeln!(f, "Mean of true closes: {:.6}", self.evaluation.mean_truth)?;
        writeln!(f, "Mean of predictions: {:.6}", self.evaluation.mean_prediction)?;
        write!(
            f,
            "RMSE {:.6}, MAE {:.6}, R2 {:.6}",
            self.evaluation.rmse, self.evaluation.mae, self.evaluation.r2
        )?;
        match self.evaluation.msle {
            Some(msle) => writeln!(f, ", MSLE {:.6}", msle)?,
            None => writeln!(f, ", MSLE n/a")?,
        }
        writeln!(f, "\nTrue closes:\n{}", self.truth_summary)?;
        write!(f, "\nPredictions:\n{}", self.prediction_summary)
    }
}

/// Run the whole pipeline over a price series with a caller-owned model
pub fn run<M>(
    config: &PipelineConfig,
    series: &PriceSeries,
    model: &mut M,
) -> Result<Report>
where
    M: Forecaster + ?Sized,
{
    config.validate()?;
    let closes = series.closes();
    let len = closes.len();
    let window = config.window;
    let boundary = split_boundary(len, config.train_ratio)?;
    let insufficient = || Error::InsufficientData {
        len,
        window,
        boundary,
    };
    if len < window + 1 || boundary <= window || boundary >= len {
        return Err(insufficient());
    }
    log::info!(
        "{}: {} closes, split at {}, window {}",
        config.ticker,
        len,
        boundary,
        window
    );

    let scaler = match config.fit_scope {
        FitScope::FullSeries => MinMaxScaler::fit(closes)?,
        FitScope::TrainingOnly => MinMaxScaler::fit(&closes[..boundary])?,
    };
    let scaled = scaler.transform_all(closes);
    let dataset = build_windows(&scaled, window, boundary)?;
    log::info!(
        "training on {} windows, evaluating on {}",
        dataset.train.len(),
        dataset.eval.len()
    );

    let training = model.fit(&dataset.train)?;
    log::info!(
        "trained for {} epochs ({} batches), final loss {:.6}",
        training.epochs,
        training.batches,
        training.final_loss
    );

    let truth: Vec<f64> = dataset.eval.iter().map(|w| closes[w.target_index]).collect();
    let evaluation = evaluate(model, &dataset.eval, &scaler, &truth)?;
    let validation: Vec<ValidationRow> = dataset
        .eval
        .iter()
        .zip(&evaluation.predictions)
        .map(|(w, &prediction)| ValidationRow {
            date: series.dates()[w.target_index],
            close: closes[w.target_index],
            prediction,
        })
        .collect();
    let truth_summary = Summary::describe(&truth).ok_or_else(insufficient)?;
    let prediction_summary = Summary::describe(&evaluation.predictions).ok_or_else(insufficient)?;

    Ok(Report {
        ticker: config.ticker.clone(),
        len,
        window,
        boundary,
        scaler_bounds: scaler.bounds(),
        training,
        evaluation,
        validation,
        truth_summary,
        prediction_summary,
    })
}
