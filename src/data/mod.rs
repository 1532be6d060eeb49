/*!
Data processing and IO functions
*/
use crate::*;
use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use ta::{Close, High, Low, Open, Volume};

pub mod fake;
pub mod scale;
pub mod window;
pub mod yahoo;

/// One trading day of data for a stock
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Tick<F = CpuFloat> {
    /// The trading date
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// The opening price
    #[serde(rename = "Open")]
    pub open: F,
    /// The highest price of the day
    #[serde(rename = "High")]
    pub high: F,
    /// The lowest price of the day
    #[serde(rename = "Low")]
    pub low: F,
    /// The closing price
    #[serde(rename = "Close")]
    pub close: F,
    /// The closing price, adjusted for splits and dividends
    #[serde(rename = "Adj Close")]
    pub adj_close: F,
    /// The number of shares traded
    #[serde(rename = "Volume")]
    pub volume: F,
}

/// The names of a tick's numeric columns, in the order `Tick::values` returns them
pub const TICK_COLUMNS: [&str; 6] = ["Open", "High", "Low", "Close", "Adj Close", "Volume"];

impl<F> Tick<F>
where
    F: Copy + Into<f64>,
{
    /// Every numeric column of this tick, as named by `TICK_COLUMNS`
    #[inline]
    pub fn values(&self) -> [f64; 6] {
        [
            self.open(),
            self.high(),
            self.low(),
            self.close(),
            self.adj_close.into(),
            self.volume(),
        ]
    }
}

impl<F> Open for Tick<F>
where
    F: Copy + Into<f64>,
{
    #[inline]
    fn open(&self) -> f64 {
        self.open.into()
    }
}

impl<F> High for Tick<F>
where
    F: Copy + Into<f64>,
{
    #[inline]
    fn high(&self) -> f64 {
        self.high.into()
    }
}

impl<F> Low for Tick<F>
where
    F: Copy + Into<f64>,
{
    #[inline]
    fn low(&self) -> f64 {
        self.low.into()
    }
}

impl<F> Close for Tick<F>
where
    F: Copy + Into<f64>,
{
    #[inline]
    fn close(&self) -> f64 {
        self.close.into()
    }
}

impl<F> Volume for Tick<F>
where
    F: Copy + Into<f64>,
{
    #[inline]
    fn volume(&self) -> f64 {
        self.volume.into()
    }
}

/// A series of daily closing prices, strictly ascending by date.
///
/// Days the market was closed are simply absent; nothing is interpolated.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    closes: Vec<CpuFloat>,
}

impl PriceSeries {
    /// Build a series from `(date, close)` pairs, checking ordering and finiteness
    pub fn new(points: Vec<(NaiveDate, CpuFloat)>) -> Result<PriceSeries> {
        if points.is_empty() {
            return Err(Error::DataUnavailable {
                ticker: String::new(),
                reason: "price series is empty".into(),
            });
        }
        for (index, (_, close)) in points.iter().enumerate() {
            if !close.is_finite() {
                return Err(Error::InvalidSeries {
                    index,
                    reason: format!("closing price {} is not finite", close),
                });
            }
        }
        if let Some((index, ((prev, _), (next, _)))) = points
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, ((prev, _), (next, _)))| next <= prev)
        {
            return Err(Error::InvalidSeries {
                index: index + 1,
                reason: format!("date {} does not follow {}", next, prev),
            });
        }
        let (dates, closes) = points.into_iter().unzip();
        Ok(PriceSeries { dates, closes })
    }

    /// Select the closing price of each tick
    pub fn from_ticks<F>(ticks: &[Tick<F>]) -> Result<PriceSeries>
    where
        F: Copy + Into<f64>,
    {
        Self::new(ticks.iter().map(|tick| (tick.date, tick.close())).collect())
    }

    /// The number of trading days in this series
    #[inline]
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    /// Whether this series is empty. Never true for a constructed series.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    /// The trading dates, ascending
    #[inline]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// The closing prices, in date order
    #[inline]
    pub fn closes(&self) -> &[CpuFloat] {
        &self.closes
    }

    /// Get the `i`th `(date, close)` pair
    #[inline]
    pub fn get(&self, i: usize) -> Option<(NaiveDate, CpuFloat)> {
        Some((*self.dates.get(i)?, *self.closes.get(i)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd(2024, 3, d)
    }

    #[test]
    fn selects_closing_prices() {
        let ticks = [
            Tick {
                date: day(4),
                open: 14.1,
                high: 14.6,
                low: 13.9,
                close: 14.5,
                adj_close: 12.2,
                volume: 1.2e7,
            },
            Tick {
                date: day(5),
                open: 14.5,
                high: 14.8,
                low: 14.2,
                close: 14.3,
                adj_close: 12.0,
                volume: 9.8e6,
            },
        ];
        let series = PriceSeries::from_ticks(&ticks).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), &[14.5, 14.3]);
        assert_eq!(series.dates(), &[day(4), day(5)]);
        assert_eq!(series.get(1), Some((day(5), 14.3)));
        assert_eq!(series.get(2), None);
    }

    #[test]
    fn rejects_unordered_dates() {
        match PriceSeries::new(vec![(day(4), 1.0), (day(6), 2.0), (day(6), 3.0)]) {
            Err(Error::InvalidSeries { index: 2, .. }) => {}
            other => panic!("expected invalid series, got {:?}", other),
        }
        assert!(PriceSeries::new(vec![(day(6), 1.0), (day(5), 2.0)]).is_err());
    }

    #[test]
    fn rejects_missing_closes() {
        match PriceSeries::new(vec![(day(4), 1.0), (day(5), f64::NAN)]) {
            Err(Error::InvalidSeries { index: 1, .. }) => {}
            other => panic!("expected invalid series, got {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_series() {
        assert!(matches!(
            PriceSeries::new(Vec::new()),
            Err(Error::DataUnavailable { .. })
        ));
    }
}
