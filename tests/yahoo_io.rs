/*!
Test Yahoo Finance CSV IO
*/
use chrono::NaiveDate;
use closeburn::data::{fake::*, yahoo::*, *};
use closeburn::Error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Normal;
use std::io::{Seek, SeekFrom};
use tempfile::tempfile;

fn fake_ticks(seed: u64) -> TickGen<TradingDays, StdRng> {
    TickGen {
        days: TradingDays(NaiveDate::from_ymd(2014, 1, 1)),
        prices: PriceRandomWalk {
            rng: StdRng::seed_from_u64(seed),
            price: 15.0,
            returns: Normal::new(0.0, 0.02).unwrap(),
            spread: Normal::new(0.0, 0.01).unwrap(),
            volume: Normal::new(2e7, 5e6).unwrap(),
        },
    }
}

#[test]
fn fake_data_roundtrip() {
    const TEST_DATA_LENGTH: usize = 2733;
    let ticks: Vec<Tick> = fake_ticks(11).take(TEST_DATA_LENGTH).collect();
    let mut tmp = tempfile().expect("Tempfile creation should not fail!");
    let written =
        write_ticks(&mut tmp, ticks.iter().copied()).expect("Writing test data should not fail!");
    assert_eq!(written, TEST_DATA_LENGTH);
    tmp.seek(SeekFrom::Start(0)).expect("Seek should not fail");
    let read_ticks = read_ticks(&mut tmp).expect("Reading test data should not fail");
    assert_eq!(ticks, read_ticks);
}

#[test]
fn reads_yahoo_export() {
    let csv = "\
Date,Open,High,Low,Close,Adj Close,Volume
2014-01-02,11.41,11.51,11.15,11.17,6.03,17624300
2014-01-03,11.15,11.25,10.83,10.91,5.89,19444000
";
    let ticks = read_ticks(csv.as_bytes()).unwrap();
    assert_eq!(ticks.len(), 2);
    assert_eq!(ticks[1].date, NaiveDate::from_ymd(2014, 1, 3));
    assert_eq!(ticks[1].adj_close, 5.89);
    let series = PriceSeries::from_ticks(&ticks).unwrap();
    assert_eq!(series.closes(), &[11.17, 10.91]);
}

#[test]
fn malformed_rows_are_errors() {
    let csv = "\
Date,Open,High,Low,Close,Adj Close,Volume
2014-01-02,11.41,11.51,11.15,oops,6.03,17624300
";
    assert!(matches!(read_ticks(csv.as_bytes()), Err(Error::Csv(_))));
}
