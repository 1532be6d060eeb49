/*!
Scoring predictions against held-out closes
*/
use crate::data::scale::MinMaxScaler;
use crate::data::window::Window;
use crate::data::{Tick, TICK_COLUMNS};
use crate::model::Forecaster;
use crate::util::mean;
use crate::{Error, Result};
use std::fmt::{self, Display};

fn check_shape(pred: &[f64], truth: &[f64]) -> Result<()> {
    if pred.len() != truth.len() {
        return Err(Error::ShapeMismatch {
            predictions: pred.len(),
            targets: truth.len(),
        });
    }
    if pred.is_empty() {
        return Err(Error::EmptyInput("prediction set"));
    }
    Ok(())
}

/// Mean squared error
pub fn mse(pred: &[f64], truth: &[f64]) -> Result<f64> {
    check_shape(pred, truth)?;
    let sum: f64 = pred.iter().zip(truth).map(|(p, t)| (p - t).powi(2)).sum();
    Ok(sum / pred.len() as f64)
}

/// Root mean squared error: the square root of the mean of the squared differences
pub fn rmse(pred: &[f64], truth: &[f64]) -> Result<f64> {
    Ok(mse(pred, truth)?.sqrt())
}

/// Mean absolute error
pub fn mae(pred: &[f64], truth: &[f64]) -> Result<f64> {
    check_shape(pred, truth)?;
    let sum: f64 = pred.iter().zip(truth).map(|(p, t)| (p - t).abs()).sum();
    Ok(sum / pred.len() as f64)
}

/// Mean squared logarithmic error, `mean((ln(1 + t) - ln(1 + p))^2)`. Negative values have no log and are
/// rejected.
pub fn msle(pred: &[f64], truth: &[f64]) -> Result<f64> {
    check_shape(pred, truth)?;
    if let Some(index) = pred.iter().chain(truth).position(|v| *v < 0.0) {
        return Err(Error::InvalidSeries {
            index: index % pred.len(),
            reason: "squared log error of a negative value".into(),
        });
    }
    let sum: f64 = pred
        .iter()
        .zip(truth)
        .map(|(p, t)| (t.ln_1p() - p.ln_1p()).powi(2))
        .sum();
    Ok(sum / pred.len() as f64)
}

/// Coefficient of determination. Zero if the truth has no variance.
pub fn r2_score(pred: &[f64], truth: &[f64]) -> Result<f64> {
    check_shape(pred, truth)?;
    let truth_mean = mean(truth).unwrap_or(0.0);
    let ss_res: f64 = pred.iter().zip(truth).map(|(p, t)| (t - p).powi(2)).sum();
    let ss_tot: f64 = truth.iter().map(|t| (t - truth_mean).powi(2)).sum();
    Ok(if ss_tot == 0.0 {
        0.0
    } else {
        1.0 - ss_res / ss_tot
    })
}

/// Descriptive statistics of a sample, laid out like a `describe` table
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Summary {
    /// The sample size
    pub count: usize,
    /// The sample mean
    pub mean: f64,
    /// The sample standard deviation (`n - 1` denominator)
    pub std: f64,
    /// The smallest value
    pub min: f64,
    /// The first quartile
    pub q25: f64,
    /// The median
    pub q50: f64,
    /// The third quartile
    pub q75: f64,
    /// The largest value
    pub max: f64,
}

impl Summary {
    /// Describe a sample, or return `None` if it is empty
    pub fn describe(values: &[f64]) -> Option<Summary> {
        let mean = mean(values)?;
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let quantile = |q: f64| {
            let pos = q * (sorted.len() - 1) as f64;
            let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        };
        let std = if values.len() > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (values.len() - 1) as f64).sqrt()
        } else {
            f64::NAN
        };
        Some(Summary {
            count: values.len(),
            mean,
            std,
            min: sorted[0],
            q25: quantile(0.25),
            q50: quantile(0.5),
            q75: quantile(0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "count {:>12}", self.count)?;
        writeln!(f, "mean  {:>12.6}", self.mean)?;
        writeln!(f, "std   {:>12.6}", self.std)?;
        writeln!(f, "min   {:>12.6}", self.min)?;
        writeln!(f, "25%   {:>12.6}", self.q25)?;
        writeln!(f, "50%   {:>12.6}", self.q50)?;
        writeln!(f, "75%   {:>12.6}", self.q75)?;
        write!(f, "max   {:>12.6}", self.max)
    }
}

/// One column of every tick, in `TICK_COLUMNS` order
fn tick_columns(ticks: &[Tick]) -> Vec<Vec<f64>> {
    (0..TICK_COLUMNS.len())
        .map(|c| ticks.iter().map(|t| t.values()[c]).collect())
        .collect()
}

/// A `describe` table over every numeric column of a daily history
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// Each column's name and statistics
    pub columns: Vec<(&'static str, Summary)>,
}

impl TickSummary {
    /// Describe every column of a history, or return `None` if it is empty
    pub fn describe(ticks: &[Tick]) -> Option<TickSummary> {
        let columns = TICK_COLUMNS
            .iter()
            .zip(tick_columns(ticks))
            .map(|(name, values)| Summary::describe(&values).map(|s| (*name, s)))
            .collect::<Option<Vec<_>>>()?;
        Some(TickSummary { columns })
    }
}

impl Display for TickSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:5}", "")?;
        for (name, _) in &self.columns {
            write!(f, " {:>16}", name)?;
        }
        let rows: [(&str, fn(&Summary) -> f64); 8] = [
            ("count", |s| s.count as f64),
            ("mean", |s| s.mean),
            ("std", |s| s.std),
            ("min", |s| s.min),
            ("25%", |s| s.q25),
            ("50%", |s| s.q50),
            ("75%", |s| s.q75),
            ("max", |s| s.max),
        ];
        for (label, stat) in rows.iter() {
            write!(f, "\n{:5}", label)?;
            for (_, summary) in &self.columns {
                write!(f, " {:>16.4}", stat(summary))?;
            }
        }
        Ok(())
    }
}

/// Pearson correlation coefficient. NaN if either sample has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<f64> {
    check_shape(xs, ys)?;
    let (mx, my) = (mean(xs).unwrap_or(0.0), mean(ys).unwrap_or(0.0));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    Ok(if sxx == 0.0 || syy == 0.0 {
        f64::NAN
    } else {
        sxy / (sxx * syy).sqrt()
    })
}

/// Pairwise Pearson correlations between the numeric columns of a daily history
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    /// The column names, labelling both rows and columns
    pub columns: Vec<&'static str>,
    /// `values[i][j]` is the correlation of column `i` with column `j`
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlate every pair of tick columns
    pub fn of_ticks(ticks: &[Tick]) -> Result<CorrelationMatrix> {
        let columns = tick_columns(ticks);
        let values = columns
            .iter()
            .map(|xs| columns.iter().map(|ys| pearson(xs, ys)).collect())
            .collect::<Result<Vec<Vec<f64>>>>()?;
        Ok(CorrelationMatrix {
            columns: TICK_COLUMNS.to_vec(),
            values,
        })
    }
}

impl Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:10}", "")?;
        for name in &self.columns {
            write!(f, " {:>10}", name)?;
        }
        for (name, row) in self.columns.iter().zip(&self.values) {
            write!(f, "\n{:10}", name)?;
            for value in row {
                write!(f, " {:>10.4}", value)?;
            }
        }
        Ok(())
    }
}

/// The result of scoring a model on the evaluation windows
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The predictions, unscaled back to prices
    pub predictions: Vec<f64>,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Mean squared logarithmic error, if no price is negative
    pub msle: Option<f64>,
    /// The mean of the true closes
    pub mean_truth: f64,
    /// The mean of the predicted closes
    pub mean_prediction: f64,
}

/// Predict every evaluation window, unscale the predictions and score them against the raw closes
pub fn evaluate<M>(
    model: &M,
    windows: &[Window],
    scaler: &MinMaxScaler,
    truth: &[f64],
) -> Result<Evaluation>
where
    M: Forecaster + ?Sized,
{
    let scaled = model.predict(windows)?;
    if scaled.len() != windows.len() {
        return Err(Error::ShapeMismatch {
            predictions: scaled.len(),
            targets: windows.len(),
        });
    }
    if let Some(index) = scaled.iter().position(|p| !p.is_finite()) {
        return Err(Error::InvalidSeries {
            index,
            reason: "non-finite prediction".into(),
        });
    }
    let predictions = scaler.inverse_all(&scaled);
    let rmse = rmse(&predictions, truth)?;
    let mae = mae(&predictions, truth)?;
    let r2 = r2_score(&predictions, truth)?;
    let msle = match msle(&predictions, truth) {
        Ok(msle) => Some(msle),
        Err(Error::InvalidSeries { index, .. }) => {
            log::warn!("skipping squared log error: negative price at {}", index);
            None
        }
        Err(err) => return Err(err),
    };
    log::info!(
        "evaluated {} windows: rmse = {:.5}, mae = {:.5}, r2 = {:.5}",
        predictions.len(),
        rmse,
        mae,
        r2
    );
    Ok(Evaluation {
        mean_truth: mean(truth).unwrap_or(f64::NAN),
        mean_prediction: mean(&predictions).unwrap_or(f64::NAN),
        predictions,
        rmse,
        mae,
        r2,
        msle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rmse_averages_squared_errors() {
        assert_eq!(rmse(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap(), 0.0);
        // Errors of +1 and -1 cancel in the mean but not in the squares
        assert_relative_eq!(rmse(&[2.0, 1.0], &[1.0, 2.0]).unwrap(), 1.0);
        assert_relative_eq!(rmse(&[3.0, 0.0], &[0.0, 4.0]).unwrap(), 12.5f64.sqrt());
        assert!(rmse(&[1.0, 2.0, 3.0 + 1e-9], &[1.0, 2.0, 3.0]).unwrap() > 0.0);
    }

    #[test]
    fn metrics_check_shapes() {
        match rmse(&[1.0, 2.0], &[1.0]) {
            Err(Error::ShapeMismatch {
                predictions: 2,
                targets: 1,
            }) => {}
            other => panic!("expected shape mismatch, got {:?}", other),
        }
        assert!(matches!(mae(&[], &[]), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn other_metrics() {
        let truth = [10.0, 20.0, 30.0, 40.0];
        let pred = [12.0, 18.0, 33.0, 40.0];
        assert_relative_eq!(mae(&pred, &truth).unwrap(), 1.75);
        assert_relative_eq!(r2_score(&pred, &truth).unwrap(), 1.0 - 17.0 / 500.0);
        assert_eq!(r2_score(&[1.0, 2.0], &[3.0, 3.0]).unwrap(), 0.0);
    }

    #[test]
    fn squared_log_error() {
        // ln(1 + e - 1) = 1 and ln(1 + 0) = 0
        let e = std::f64::consts::E;
        assert_relative_eq!(msle(&[0.0, e - 1.0], &[e - 1.0, e - 1.0]).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(msle(&[3.0, 4.0], &[3.0, 4.0]).unwrap(), 0.0);
        match msle(&[1.0, -0.5], &[1.0, 2.0]) {
            Err(Error::InvalidSeries { index: 1, .. }) => {}
            other => panic!("expected invalid series, got {:?}", other),
        }
        assert!(matches!(
            msle(&[1.0, 2.0], &[-1.0, 2.0]),
            Err(Error::InvalidSeries { index: 0, .. })
        ));
    }

    #[test]
    fn describe_matches_linear_quantiles() {
        let summary = Summary::describe(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(summary.count, 5);
        assert_relative_eq!(summary.mean, 3.0);
        assert_relative_eq!(summary.std, 2.5f64.sqrt());
        assert_eq!((summary.min, summary.q25, summary.q50), (1.0, 2.0, 3.0));
        assert_eq!((summary.q75, summary.max), (4.0, 5.0));
        let even = Summary::describe(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(even.q25, 1.75);
        assert_relative_eq!(even.q50, 2.5);
        assert!(Summary::describe(&[]).is_none());
        assert!(Summary::describe(&[7.0]).unwrap().std.is_nan());
    }

    fn ticks() -> Vec<Tick> {
        let day = |d| chrono::NaiveDate::from_ymd(2024, 3, d);
        vec![
            Tick {
                date: day(4),
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: 1.5,
                adj_close: 1.0,
                volume: 300.0,
            },
            Tick {
                date: day(5),
                open: 2.0,
                high: 3.0,
                low: 1.5,
                close: 2.5,
                adj_close: 2.0,
                volume: 200.0,
            },
            Tick {
                date: day(6),
                open: 3.0,
                high: 5.0,
                low: 2.5,
                close: 3.5,
                adj_close: 3.0,
                volume: 100.0,
            },
        ]
    }

    #[test]
    fn describe_every_tick_column() {
        let summary = TickSummary::describe(&ticks()).unwrap();
        let names: Vec<_> = summary.columns.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["Open", "High", "Low", "Close", "Adj Close", "Volume"]);
        let (_, close) = summary.columns[3];
        assert_eq!(close.count, 3);
        assert_relative_eq!(close.mean, 2.5);
        assert_relative_eq!(close.std, 1.0);
        assert_eq!((close.min, close.q50, close.max), (1.5, 2.5, 3.5));
        let (_, high) = summary.columns[1];
        assert_relative_eq!(high.mean, 10.0 / 3.0);
        assert_relative_eq!(high.q75, 4.0);
        let (_, volume) = summary.columns[5];
        assert_relative_eq!(volume.mean, 200.0);
        assert_relative_eq!(volume.std, 100.0);
        assert!(TickSummary::describe(&[]).is_none());
        let table = format!("{}", summary);
        assert!(table.starts_with("      "));
        assert_eq!(table.lines().count(), 9);
    }

    #[test]
    fn correlate_tick_columns() {
        let matrix = CorrelationMatrix::of_ticks(&ticks()).unwrap();
        assert_eq!(matrix.columns.len(), 6);
        for i in 0..6 {
            assert_relative_eq!(matrix.values[i][i], 1.0);
            for j in 0..6 {
                assert_relative_eq!(matrix.values[i][j], matrix.values[j][i]);
            }
        }
        // Open, Low, Close and Adj Close all step by one; Volume steps down
        assert_relative_eq!(matrix.values[0][3], 1.0);
        assert_relative_eq!(matrix.values[2][4], 1.0);
        assert_relative_eq!(matrix.values[0][5], -1.0);
        // High is 2, 3, 5: covariance 3 over sqrt(2 * 14/3) with Open
        assert_relative_eq!(matrix.values[0][1], 3.0 / (28.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(matrix.values[1][5], -3.0 / (28.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert!(pearson(&[1.0, 1.0], &[1.0, 2.0]).unwrap().is_nan());
        assert!(CorrelationMatrix::of_ticks(&[]).is_err());
        assert_eq!(format!("{}", matrix).lines().count(), 7);
    }
}
