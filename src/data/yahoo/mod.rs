/*!
[Yahoo Finance](https://finance.yahoo.com/)-specific data acquisition and IO code
*/
use super::Tick;
use crate::util::{exchange_date, to_timestamp};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::{Read, Write};

/// The default Yahoo Finance API host
pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

fn unavailable(ticker: &str, reason: impl Into<String>) -> Error {
    Error::DataUnavailable {
        ticker: ticker.into(),
        reason: reason.into(),
    }
}

/// Parse a Yahoo v8 chart response into daily ticks, ascending by date.
///
/// Days with any missing field are dropped. If two rows fall on the same date, the later one wins.
pub fn parse_chart(ticker: &str, body: &str) -> Result<Vec<Tick>> {
    let response: ChartResponse = serde_json::from_str(body)?;
    if let Some(error) = response.chart.error {
        return Err(unavailable(
            ticker,
            format!("{}: {}", error.code, error.description),
        ));
    }
    let data = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| unavailable(ticker, "empty chart result"))?;
    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| unavailable(ticker, "no quote data"))?;
    let adjclose = data
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|adj| adj.adjclose);
    let field = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

    let mut ticks = Vec::with_capacity(timestamps.len());
    let mut dropped = 0;
    for (i, &ts) in timestamps.iter().enumerate() {
        let close = field(&quote.close, i);
        let adj_close = match &adjclose {
            Some(adj) => field(adj, i),
            None => close,
        };
        let row = (
            exchange_date(ts, data.meta.gmtoffset),
            field(&quote.open, i),
            field(&quote.high, i),
            field(&quote.low, i),
            close,
            adj_close,
            field(&quote.volume, i),
        );
        if let (Some(date), Some(open), Some(high), Some(low), Some(close), Some(adj_close), Some(volume)) = row {
            ticks.push(Tick {
                date,
                open,
                high,
                low,
                close,
                adj_close,
                volume,
            });
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        log::warn!("dropped {} incomplete rows for {}", dropped, ticker);
    }
    ticks.sort_by_key(|tick| tick.date);
    ticks.reverse();
    ticks.dedup_by_key(|tick| tick.date);
    ticks.reverse();
    if ticks.is_empty() {
        return Err(unavailable(ticker, "no complete daily rows"));
    }
    Ok(ticks)
}

/// A blocking Yahoo Finance client
#[derive(Debug, Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl YahooClient {
    /// Create a client for the public Yahoo Finance API
    pub fn new() -> Result<YahooClient> {
        Self::with_base_url(YAHOO_BASE_URL)
    }

    /// Create a client for an API at a different host
    pub fn with_base_url(base_url: &str) -> Result<YahooClient> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(YahooClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// The chart URL for daily history of `ticker` from `start` (inclusive) to `end` (exclusive)
    pub fn history_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/v8/finance/chart/{}?interval=1d&period1={}&period2={}&events=history",
            self.base_url,
            ticker,
            to_timestamp(start),
            to_timestamp(end)
        )
    }

    /// Fetch daily history of `ticker` from `start` (inclusive) to `end` (exclusive).
    ///
    /// There is no retry: transport errors and empty results are returned as they are.
    pub fn fetch_range(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Tick>> {
        if start >= end {
            return Err(unavailable(
                ticker,
                format!("empty date range {} to {}", start, end),
            ));
        }
        let url = self.history_url(ticker, start, end);
        log::info!("Fetching Yahoo data from: {}", url);
        let body = self.client.get(&url).send()?.text()?;
        let ticks = parse_chart(ticker, &body)?;
        log::info!("Fetched {} daily ticks for {}", ticks.len(), ticker);
        Ok(ticks)
    }
}

/// Read daily tick data, in the CSV layout Yahoo Finance exports, from a Reader
pub fn read_ticks<R: Read>(rdr: R) -> Result<Vec<Tick>> {
    let ticks = csv::Reader::from_reader(rdr)
        .into_deserialize()
        .collect::<std::result::Result<Vec<Tick>, csv::Error>>()?;
    Ok(ticks)
}

/// Write tick data to a Writer
/// On success, return how many ticks were written
pub fn write_ticks<W, I>(wtr: W, ticks: I) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Tick>,
{
    let mut wtr = csv::Writer::from_writer(wtr);
    let mut written = 0;
    for tick in ticks {
        wtr.serialize(tick)?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}
