//! forecast-tui: a terminal UI for forecasting a time series loaded from CSV
//!
//! Load a file, pick the date and value columns, tune a few model
//! parameters and inspect the forecast with its trend and seasonal
//! components. A headless `forecast` command prints the same predictions.

mod app;
mod cli;
mod data;
mod error;
mod forecast;
mod logging;
mod session;
mod ui;

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use cli::{AppConfig, Cli, Commands, ForecastArgs, OutputFormat};
use data::{format_number, TIMESTAMP_FORMAT};
use forecast::{ForecastConfig, ForecastResult, Prediction};
use logging::{LogConfig, LogTarget};
use session::Session;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let verbose = cli.verbose;
    let log_file = cli.log_file.clone();

    match cli.command() {
        Commands::Show(args) => {
            // The terminal belongs to the UI; only log to a file
            let log_config = LogConfig::from_verbosity(verbose).with_log_file(log_file, LogTarget::Off);
            logging::init_logging(&log_config).context("failed to initialise logging")?;

            let config = AppConfig::from_show_args(args).context("invalid forecast options")?;
            tracing::debug!(?config, "starting UI");
            app::run(config)?;
        }
        Commands::Forecast(args) => {
            let log_config = LogConfig::from_verbosity(verbose)
                .with_log_file(log_file, LogTarget::Stderr)
                .with_ansi(false);
            logging::init_logging(&log_config).context("failed to initialise logging")?;

            run_headless(&args)?;
        }
    }

    Ok(())
}

/// Load, map and fit without the UI, printing predictions to stdout
fn run_headless(args: &ForecastArgs) -> Result<()> {
    let config = args.model.to_config().context("invalid forecast options")?;

    let mut session = Session::default();
    session
        .load_file(&args.file)
        .with_context(|| format!("failed to load {}", args.file))?;
    session
        .map_columns(&args.date_column, &args.value_column)
        .context("failed to map columns")?;
    let model = session.model_name();
    let result = session
        .run_forecast(&config)
        .with_context(|| format!("{model} forecast failed"))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_predictions(result, args.format, args.future_only, &mut out)?;
    out.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    model: &'a str,
    config: &'a ForecastConfig,
    changepoints: Vec<String>,
    significant_changepoints: Vec<String>,
    predictions: Vec<JsonPrediction>,
}

#[derive(Serialize)]
struct JsonPrediction {
    ds: String,
    yhat: f64,
    yhat_lower: f64,
    yhat_upper: f64,
    trend: f64,
    trend_lower: f64,
    trend_upper: f64,
}

impl From<&Prediction> for JsonPrediction {
    fn from(p: &Prediction) -> Self {
        JsonPrediction {
            ds: p.ds.format(TIMESTAMP_FORMAT).to_string(),
            yhat: p.yhat,
            yhat_lower: p.yhat_lower,
            yhat_upper: p.yhat_upper,
            trend: p.trend,
            trend_lower: p.trend_lower,
            trend_upper: p.trend_upper,
        }
    }
}

const PREDICTION_HEADERS: [&str; 7] = [
    "ds",
    "yhat",
    "yhat_lower",
    "yhat_upper",
    "trend",
    "trend_lower",
    "trend_upper",
];

fn write_predictions<W: Write>(
    result: &ForecastResult,
    format: OutputFormat,
    future_only: bool,
    out: W,
) -> Result<()> {
    let predictions = if future_only {
        result.future()
    } else {
        &result.predictions[..]
    };

    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(PREDICTION_HEADERS)?;
            for p in predictions {
                writer.write_record([
                    p.ds.format(TIMESTAMP_FORMAT).to_string(),
                    format_number(p.yhat),
                    format_number(p.yhat_lower),
                    format_number(p.yhat_upper),
                    format_number(p.trend),
                    format_number(p.trend_lower),
                    format_number(p.trend_upper),
                ])?;
            }
            writer.flush()?;
        }
        OutputFormat::Json => {
            let stamp = |ds: &chrono::NaiveDateTime| ds.format(TIMESTAMP_FORMAT).to_string();
            let report = JsonReport {
                model: &result.model,
                config: &result.config,
                changepoints: result.changepoints.iter().map(stamp).collect(),
                significant_changepoints: result.significant_changepoints.iter().map(stamp).collect(),
                predictions: predictions.iter().map(JsonPrediction::from).collect(),
            };
            serde_json::to_writer_pretty(out, &report)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{map_columns, RawTable};
    use crate::forecast::{DecomposableForecaster, Forecaster};

    fn result() -> ForecastResult {
        let raw = RawTable::new(
            vec!["day".into(), "sales".into()],
            vec![
                vec!["2020-01-01".into(), "10".into()],
                vec!["2020-01-02".into(), "12".into()],
                vec!["2020-01-03".into(), "11".into()],
            ],
        );
        let table = map_columns(&raw, "day", "sales").unwrap();
        let config = ForecastConfig::new(5, 0.05, 10.0, Default::default()).unwrap();
        DecomposableForecaster::new().fit(&table, &config).unwrap()
    }

    #[test]
    fn test_csv_output() {
        let mut buf = Vec::new();
        write_predictions(&result(), OutputFormat::Csv, false, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ds,yhat,yhat_lower,yhat_upper,trend,trend_lower,trend_upper");
        assert_eq!(lines.len(), 1 + 3 + 5);
        assert!(lines[1].starts_with("2020-01-01 00:00:00,"));
    }

    #[test]
    fn test_future_only_json_output() {
        let mut buf = Vec::new();
        write_predictions(&result(), OutputFormat::Json, true, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let predictions = value["predictions"].as_array().unwrap();
        assert_eq!(predictions.len(), 5);
        assert_eq!(predictions[0]["ds"], "2020-01-04 00:00:00");
        assert_eq!(value["model"], "decomposable");
        assert_eq!(value["config"]["seasonality_mode"], "additive");
    }
}
