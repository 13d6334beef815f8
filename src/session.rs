//! Per-session state: the loaded file, the mapped table and the last forecast.
//!
//! Each step replaces its slot only when it succeeds, so a failure leaves
//! whatever was shown before untouched.

use std::path::{Path, PathBuf};

use crate::data::{self, ForecastTable, RawTable};
use crate::error::{Error, Result};
use crate::forecast::{
    build_plots, DecomposableForecaster, ForecastConfig, ForecastResult, Forecaster, PlotArtifacts,
};

pub struct Session {
    forecaster: Box<dyn Forecaster>,
    source: Option<PathBuf>,
    raw: Option<RawTable>,
    forecast_table: Option<ForecastTable>,
    result: Option<ForecastResult>,
    plots: Option<PlotArtifacts>,
}

impl Default for Session {
    fn default() -> Self {
        Session::new(Box::new(DecomposableForecaster::default()))
    }
}

impl Session {
    pub fn new(forecaster: Box<dyn Forecaster>) -> Self {
        Session {
            forecaster,
            source: None,
            raw: None,
            forecast_table: None,
            result: None,
            plots: None,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn raw(&self) -> Option<&RawTable> {
        self.raw.as_ref()
    }

    pub fn forecast_table(&self) -> Option<&ForecastTable> {
        self.forecast_table.as_ref()
    }

    pub fn result(&self) -> Option<&ForecastResult> {
        self.result.as_ref()
    }

    pub fn plots(&self) -> Option<&PlotArtifacts> {
        self.plots.as_ref()
    }

    pub fn model_name(&self) -> &'static str {
        self.forecaster.name()
    }

    /// Load a CSV file. Mapped data and forecasts from earlier files are kept.
    pub fn load_file(&mut self, path: &str) -> Result<&RawTable> {
        let path = data::expand_path(path);
        let raw = data::load_csv(&path)?;
        self.source = Some(path);
        Ok(self.raw.insert(raw))
    }

    /// Map two columns of the loaded file into a forecast table
    pub fn map_columns(&mut self, date_column: &str, value_column: &str) -> Result<&ForecastTable> {
        let raw = self.raw.as_ref().ok_or(Error::MissingInput("load a CSV file first"))?;
        let table = data::map_columns(raw, date_column, value_column)?;
        Ok(self.forecast_table.insert(table))
    }

    /// Fit the current forecast table and prepare plots
    pub fn run_forecast(&mut self, config: &ForecastConfig) -> Result<&ForecastResult> {
        let table = self
            .forecast_table
            .as_ref()
            .ok_or(Error::MissingInput("map a date and value column first"))?;

        tracing::debug!(model = self.forecaster.name(), rows = table.len(), "running forecast");
        let result = self.forecaster.fit(table, config)?;
        self.plots = Some(build_plots(&result));
        Ok(self.result.insert(result))
    }
}
