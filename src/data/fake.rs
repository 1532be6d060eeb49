/*!
Generate fake daily tick data, for testing purposes
*/
use super::Tick;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Iterate over weekdays starting from (and including, if it is one) a given date
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TradingDays(pub NaiveDate);

impl Iterator for TradingDays {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<NaiveDate> {
        while let Weekday::Sat | Weekday::Sun = self.0.weekday() {
            self.0 = self.0 + Duration::days(1);
        }
        let day = self.0;
        self.0 = day + Duration::days(1);
        Some(day)
    }
}

/// Generate daily closes as a geometric random walk
#[derive(Debug, Clone)]
pub struct PriceRandomWalk<R> {
    /// The RNG used by this random walk
    pub rng: R,
    /// The current price
    pub price: f64,
    /// The daily log-return distribution
    pub returns: Normal<f64>,
    /// The intraday spread distribution, as a fraction of the price
    pub spread: Normal<f64>,
    /// The daily volume distribution
    pub volume: Normal<f64>,
}

/// Generate tick data using a price generator and a date generator
#[derive(Debug, Clone)]
pub struct TickGen<D, R> {
    /// The date generator in use
    pub days: D,
    /// The price generator in use
    pub prices: PriceRandomWalk<R>,
}

impl<D, R> Iterator for TickGen<D, R>
where
    D: Iterator<Item = NaiveDate>,
    R: Rng,
{
    type Item = Tick;
    fn next(&mut self) -> Option<Tick> {
        let date = self.days.next()?;
        let walk = &mut self.prices;
        let open = walk.price;
        let close = open * walk.returns.sample(&mut walk.rng).exp();
        walk.price = close;
        let spread = walk.spread.sample(&mut walk.rng).abs();
        let high = open.max(close) * (1.0 + spread);
        let low = open.min(close) * (1.0 - spread).max(0.0);
        let volume = walk.volume.sample(&mut walk.rng).max(0.0).round();
        Some(Tick {
            date,
            open,
            high,
            low,
            close,
            adj_close: close,
            volume,
        })
    }
}
