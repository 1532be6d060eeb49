/*!
Generate some fake daily tick data and write it to stdout as CSV
*/
use anyhow::format_err;
use chrono::NaiveDate;
use clap::{App, Arg};
use closeburn::data::fake::*;
use closeburn::data::yahoo::write_ticks;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Normal;
use std::io::stdout;

fn main() -> anyhow::Result<()> {
    let matches = App::new("Fake Daily History")
        .version("1.0")
        .author("Jad Elkhaleq Ghalayini <jad.ghalayini@mail.utoronto.ca>")
        .about("Generates daily stock data as a geometric random walk, in Yahoo Finance CSV layout")
        .arg(
            Arg::with_name("DAYS")
                .help("Number of trading days to generate")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("start")
                .long("start")
                .help("First trading day, YYYY-MM-DD")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .help("RNG seed")
                .takes_value(true),
        )
        .get_matches();

    let days = usize::from_str_radix(matches.value_of("DAYS").unwrap_or("0"), 10)?;
    let start = NaiveDate::parse_from_str(matches.value_of("start").unwrap_or("2014-01-01"), "%Y-%m-%d")?;
    let rng = match matches.value_of("seed") {
        Some(seed) => StdRng::seed_from_u64(u64::from_str_radix(seed, 10)?),
        None => StdRng::from_entropy(),
    };
    let prices = PriceRandomWalk {
        rng,
        price: 15.0,
        returns: Normal::new(0.0, 0.025).map_err(|err| format_err!("{:?}", err))?,
        spread: Normal::new(0.0, 0.01).map_err(|err| format_err!("{:?}", err))?,
        volume: Normal::new(2e7, 6e6).map_err(|err| format_err!("{:?}", err))?,
    };
    let ticks = TickGen {
        days: TradingDays(start),
        prices,
    };
    let written = write_ticks(stdout(), ticks.take(days))?;
    eprintln!("Generated {} ticks", written);
    Ok(())
}
