/*!
Forecast a stock's daily close one day ahead and score the forecast on the held-out tail of its history
*/

use anyhow::format_err;
use chrono::NaiveDate;
use clap::{App, Arg, ArgMatches};
use closeburn::config::PipelineConfig;
use closeburn::data::yahoo::{read_ticks, write_ticks, YahooClient};
use closeburn::data::{PriceSeries, Tick};
use closeburn::eval::{CorrelationMatrix, TickSummary};
use closeburn::model::{Persistence, DEFAULT_FORECASTER};
use closeburn::pipeline::run;
use io_enum::*;
use std::fs::File;
use std::io::{stdin, Stdin};
use std::path::Path;

#[derive(Debug, Read)]
pub enum IoSources {
    Stdin(Stdin),
    File(File),
}

#[cfg(feature = "lstm")]
mod lstm_run {
    use super::*;
    use closeburn::data::window::Window;
    use closeburn::lstm::{build_model, CloseLSTMDesc, LstmForecaster};
    use closeburn::model::{Forecaster, TrainSummary};
    use closeburn::pipeline::Report;
    use indicatif::{ProgressBar, ProgressStyle};
    use tch::Device;

    /// An LSTM forecaster reporting training progress on a progress bar
    pub struct ProgressLstm {
        pub model: LstmForecaster,
    }

    impl Forecaster for ProgressLstm {
        fn fit(&mut self, windows: &[Window]) -> closeburn::Result<TrainSummary> {
            let epochs = self.model.train.epochs;
            let epochs_progress = ProgressBar::new(epochs as u64);
            let data_progress_style =
                ProgressStyle::default_bar().template("[{msg:<15}] {wide_bar} {pos:> 7}/{len:7}");
            let data_progress = ProgressBar::new(windows.len() as u64);
            data_progress.set_style(data_progress_style);
            data_progress.set_message("no loss");
            let batch_size = self.model.train.batch_size;
            let mut total_loss = 0.0;
            let mut max_loss = f64::NEG_INFINITY;
            let mut min_loss = f64::INFINITY;
            let summary = self.model.fit_observed(windows, |progress| {
                total_loss += progress.loss;
                max_loss = max_loss.max(progress.loss);
                min_loss = min_loss.min(progress.loss);
                let done = ((progress.batch + 1) * batch_size).min(windows.len());
                data_progress.set_position(done as u64);
                data_progress.set_message(&format!("loss = {:.5}", progress.loss));
                if progress.ends_epoch() {
                    epochs_progress.println(format!(
                        "Epoch {}: average training loss = {}, max = {}, min = {}",
                        progress.epoch,
                        total_loss / progress.batches as f64,
                        max_loss,
                        min_loss
                    ));
                    epochs_progress.inc(1);
                    total_loss = 0.0;
                    max_loss = f64::NEG_INFINITY;
                    min_loss = f64::INFINITY;
                }
            })?;
            data_progress.finish_and_clear();
            epochs_progress.finish_and_clear();
            Ok(summary)
        }

        fn predict(&self, windows: &[Window]) -> closeburn::Result<Vec<f64>> {
            self.model.predict(windows)
        }
    }

    pub fn run_lstm(
        config: &PipelineConfig,
        series: &PriceSeries,
        matches: &ArgMatches,
        verbosity: usize,
    ) -> anyhow::Result<Report> {
        let device: Device = match matches.value_of("device").unwrap_or("cuda") {
            "cuda" => Device::cuda_if_available(),
            "cpu" => Device::Cpu,
            device => return Err(format_err!("Invalid value for device: {:?}", device)),
        };
        if verbosity >= 1 {
            eprintln!("Device: {:?}", device);
        }
        let desc = CloseLSTMDesc::from(&config.model);
        let model = build_model(&desc, config.train.clone(), device)?;
        let mut model = ProgressLstm { model };
        Ok(run(config, series, &mut model)?)
    }
}

fn load_ticks(config: &PipelineConfig, matches: &ArgMatches, verbosity: usize) -> anyhow::Result<Vec<Tick>> {
    let ticks = match matches.value_of("input") {
        Some(path) => {
            let reader = if path == "-" {
                IoSources::Stdin(stdin())
            } else {
                IoSources::File(File::open(Path::new(path))?)
            };
            if verbosity >= 2 {
                eprintln!("Reading ticks from {}", path);
            }
            read_ticks(reader)?
        }
        None => {
            if verbosity >= 1 {
                eprintln!(
                    "Fetching {} from {} to {}",
                    config.ticker, config.start, config.end
                );
            }
            YahooClient::new()?.fetch_range(&config.ticker, config.start, config.end)?
        }
    };
    if let Some(path) = matches.value_of("save-history") {
        let written = write_ticks(File::create(Path::new(path))?, ticks.iter().copied())?;
        if verbosity >= 1 {
            eprintln!("Saved {} ticks to {}", written, path);
        }
    }
    Ok(ticks)
}

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format_err!("Invalid date {:?}: {}", value, err))
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();
    let matches = App::new("Closeburn")
        .version("1.0")
        .author("Jad Elkhaleq Ghalayini <jad.ghalayini@mail.utoronto.ca>")
        .about("An LSTM which attempts to predict a stock's next closing price")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .help("JSON pipeline configuration")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ticker")
                .short("t")
                .long("ticker")
                .help("Ticker to forecast")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("start")
                .long("start")
                .help("First day of history, YYYY-MM-DD")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("end")
                .long("end")
                .help("Day after the last day of history, YYYY-MM-DD")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .help("Read daily history from a CSV file (or - for stdin) instead of Yahoo Finance")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("save-history")
                .long("save-history")
                .help("Save the daily history used to a CSV file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .help("Write held-out closes and predictions to a CSV file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("epochs")
                .short("e")
                .long("epochs")
                .help("Number of training epochs")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("model")
                .short("m")
                .long("model")
                .help("Forecaster to use. Defaults to lstm when built with --features lstm, persistence otherwise")
                .possible_values(&["lstm", "persistence"])
                .takes_value(true),
        )
        .arg(
            Arg::with_name("device")
                .short("d")
                .long("device")
                .help("Device to use: cuda, cpu. Defaults to cuda")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Sets the level of verbosity")
                .takes_value(true),
        )
        .get_matches();

    let verbosity = matches
        .value_of("verbose")
        .map(|v| usize::from_str_radix(v, 10))
        .unwrap_or(Ok(0))?;

    let mut config = match matches.value_of("config") {
        Some(path) => PipelineConfig::from_json_reader(File::open(Path::new(path))?)?,
        None => PipelineConfig::default(),
    };
    if let Some(ticker) = matches.value_of("ticker") {
        config.ticker = ticker.to_string();
    }
    if let Some(start) = matches.value_of("start") {
        config.start = parse_date(start)?;
    }
    if let Some(end) = matches.value_of("end") {
        config.end = parse_date(end)?;
    }
    if let Some(epochs) = matches.value_of("epochs") {
        config.train.epochs = usize::from_str_radix(epochs, 10)?;
    }
    config.validate()?;

    let ticks = load_ticks(&config, &matches, verbosity)?;
    let series = PriceSeries::from_ticks(&ticks)?;
    if verbosity >= 1 {
        eprintln!("Loaded {} trading days", series.len());
        if let Some(summary) = TickSummary::describe(&ticks) {
            println!("History:\n{}\n", summary);
        }
        println!("Correlations:\n{}\n", CorrelationMatrix::of_ticks(&ticks)?);
    }

    let report = match matches.value_of("model").unwrap_or(DEFAULT_FORECASTER) {
        "persistence" => run(&config, &series, &mut Persistence)?,
        #[cfg(feature = "lstm")]
        "lstm" => lstm_run::run_lstm(&config, &series, &matches, verbosity)?,
        model => {
            return Err(format_err!(
                "Forecaster {:?} is unavailable; rebuild with --features lstm",
                model
            ))
        }
    };

    println!("{}", report);
    if let Some(path) = matches.value_of("output") {
        let rows = report.write_validation_csv(File::create(Path::new(path))?)?;
        if verbosity >= 1 {
            eprintln!("Wrote {} predictions to {}", rows, path);
        }
    }
    Ok(())
}
