//! Command-line interface argument parsing for forecast-tui.
//!
//! - `forecast-tui` / `forecast-tui show --file sales.csv`
//! - `forecast-tui show --file sales.csv --date-column day --value-column sales --periods 90`
//! - `forecast-tui forecast --file sales.csv --date-column day --value-column sales --format json`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::Result;
use crate::forecast::{ForecastConfig, Frequency, SeasonalityMode, DEFAULT_INTERVAL_WIDTH};

/// Terminal UI for forecasting a time series loaded from CSV.
#[derive(Parser, Debug)]
#[command(name = "forecast-tui")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Append logs to this file (the UI does not log otherwise)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive UI (default)
    Show(ShowArgs),

    /// Fit a forecast without the UI and print the prediction table
    Forecast(ForecastArgs),
}

/// Model parameters shared by both commands
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ModelArgs {
    /// Number of future periods to forecast
    #[arg(long, default_value_t = 24)]
    pub periods: u32,

    /// Flexibility of the trend
    #[arg(long, default_value_t = 0.05)]
    pub changepoint_prior_scale: f64,

    /// Strength of the seasonal components
    #[arg(long, default_value_t = 10.0)]
    pub seasonality_prior_scale: f64,

    #[arg(long, value_enum, default_value_t = SeasonalityMode::Additive)]
    pub seasonality_mode: SeasonalityMode,

    /// Step between future timestamps
    #[arg(long = "freq", value_enum, default_value_t = Frequency::Daily)]
    pub frequency: Frequency,

    /// Width of the uncertainty interval
    #[arg(long, default_value_t = DEFAULT_INTERVAL_WIDTH)]
    pub interval_width: f64,
}

impl Default for ModelArgs {
    fn default() -> Self {
        let config = ForecastConfig::default();
        ModelArgs {
            periods: config.horizon_periods,
            changepoint_prior_scale: config.changepoint_prior_scale,
            seasonality_prior_scale: config.seasonality_prior_scale,
            seasonality_mode: config.seasonality_mode,
            frequency: config.frequency,
            interval_width: config.interval_width,
        }
    }
}

impl ModelArgs {
    /// Validated model configuration
    pub fn to_config(&self) -> Result<ForecastConfig> {
        ForecastConfig::new(
            self.periods,
            self.changepoint_prior_scale,
            self.seasonality_prior_scale,
            self.seasonality_mode,
        )?
        .with_frequency(self.frequency)
        .with_interval_width(self.interval_width)
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ShowArgs {
    /// CSV file to load on startup
    #[arg(short, long)]
    pub file: Option<String>,

    /// Column to preselect as the date column
    #[arg(long)]
    pub date_column: Option<String>,

    /// Column to preselect as the value column
    #[arg(long)]
    pub value_column: Option<String>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Comma-separated hex color palette for chart lines
    /// Example: "#FF0000,#00FF00,#0000FF"
    #[arg(short, long)]
    pub color_palette: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ForecastArgs {
    /// CSV file to forecast
    #[arg(short, long)]
    pub file: String,

    #[arg(long)]
    pub date_column: String,

    #[arg(long)]
    pub value_column: String,

    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Only print predictions after the last observation
    #[arg(long)]
    pub future_only: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// The subcommand, defaulting to `show`
    pub fn command(self) -> Commands {
        self.command
            .unwrap_or_else(|| Commands::Show(ShowArgs::default()))
    }
}

/// Default chart colors
pub const DEFAULT_PALETTE: [&str; 6] = [
    "#4ECDC4", // Teal
    "#FF6B6B", // Red
    "#45B7D1", // Blue
    "#96CEB4", // Green
    "#FFEAA7", // Yellow
    "#DDA0DD", // Plum
];

/// Configuration for the interactive UI
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub file: Option<String>,
    pub date_column: Option<String>,
    pub value_column: Option<String>,
    pub forecast: ForecastConfig,
    pub color_palette: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            file: None,
            date_column: None,
            value_column: None,
            forecast: ForecastConfig::default(),
            color_palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Create AppConfig from `show` arguments
    pub fn from_show_args(args: ShowArgs) -> Result<Self> {
        let color_palette = match args.color_palette {
            Some(palette) => palette
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => AppConfig::default().color_palette,
        };

        Ok(AppConfig {
            file: args.file,
            date_column: args.date_column,
            value_column: args.value_column,
            forecast: args.model.to_config()?,
            color_palette,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_show() {
        let cli = Cli::try_parse_from(["forecast-tui"]).unwrap();
        assert_eq!(cli.verbose, 0);
        match cli.command() {
            Commands::Show(args) => assert_eq!(args, ShowArgs::default()),
            other => panic!("expected show, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::from_show_args(ShowArgs::default()).unwrap();
        assert_eq!(config.forecast, ForecastConfig::default());
        assert_eq!(config.color_palette.len(), DEFAULT_PALETTE.len());
        assert!(config.file.is_none());
    }

    #[test]
    fn test_clap_defaults_match_model_defaults() {
        let cli = Cli::try_parse_from(["forecast-tui", "show"]).unwrap();
        let Commands::Show(args) = cli.command() else {
            panic!("expected show");
        };
        assert_eq!(args.model, ModelArgs::default());
    }

    #[test]
    fn test_custom_colors() {
        let args = ShowArgs {
            color_palette: Some("#FF0000, #00FF00,".to_string()),
            ..ShowArgs::default()
        };
        let config = AppConfig::from_show_args(args).unwrap();
        assert_eq!(config.color_palette, vec!["#FF0000", "#00FF00"]);
    }

    #[test]
    fn test_show_flags() {
        let cli = Cli::try_parse_from([
            "forecast-tui",
            "-vv",
            "show",
            "--file",
            "~/sales.csv",
            "--date-column",
            "day",
            "--periods",
            "90",
            "--seasonality-mode",
            "multiplicative",
            "--freq",
            "weekly",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Show(args) = cli.command() else {
            panic!("expected show");
        };
        let config = AppConfig::from_show_args(args).unwrap();
        assert_eq!(config.file.as_deref(), Some("~/sales.csv"));
        assert_eq!(config.date_column.as_deref(), Some("day"));
        assert_eq!(config.forecast.horizon_periods, 90);
        assert_eq!(config.forecast.seasonality_mode, SeasonalityMode::Multiplicative);
        assert_eq!(config.forecast.frequency, Frequency::Weekly);
    }

    #[test]
    fn test_out_of_range_flag_is_rejected() {
        let args = ShowArgs {
            model: ModelArgs {
                seasonality_prior_scale: 25.0,
                ..ModelArgs::default()
            },
            ..ShowArgs::default()
        };
        assert!(AppConfig::from_show_args(args).is_err());
    }

    #[test]
    fn test_forecast_command_requires_columns() {
        assert!(Cli::try_parse_from(["forecast-tui", "forecast", "--file", "a.csv"]).is_err());

        let cli = Cli::try_parse_from([
            "forecast-tui",
            "forecast",
            "--file",
            "a.csv",
            "--date-column",
            "ds",
            "--value-column",
            "y",
            "--format",
            "json",
            "--future-only",
            "--log-file",
            "run.log",
        ])
        .unwrap();
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
        let Commands::Forecast(args) = cli.command() else {
            panic!("expected forecast");
        };
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.future_only);
        assert_eq!(args.model.periods, 24);
    }
}
