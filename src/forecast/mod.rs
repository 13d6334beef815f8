//! Forecast runner: model configuration, fitting and plot preparation.

mod config;
mod linalg;
mod model;
mod plot;
mod result;

pub use config::{
    ForecastConfig, Frequency, NumberSpec, SeasonalityMode, CHANGEPOINT_SPEC, DEFAULT_INTERVAL_WIDTH,
    PERIODS_SPEC, SEASONALITY_SPEC,
};
pub use model::DecomposableForecaster;
pub use plot::{build_plots, format_date_label, ComponentsPlot, ForecastPlot, PlotArtifacts, SeasonalPanel};
pub use result::{ForecastResult, Prediction};

use crate::data::ForecastTable;
use crate::error::Result;

/// A model that fits a [`ForecastTable`] and predicts over history plus horizon
pub trait Forecaster {
    /// Short model name, used in logs and errors
    fn name(&self) -> &'static str;

    /// Fit the table and predict `config.horizon_periods` steps ahead
    fn fit(&self, table: &ForecastTable, config: &ForecastConfig) -> Result<ForecastResult>;
}
