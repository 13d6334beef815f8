//! Output of a forecast run.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::data::ForecastTable;

use super::config::{ForecastConfig, SeasonalityMode};

/// One row of the prediction table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub ds: NaiveDateTime,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub trend: f64,
    pub trend_lower: f64,
    pub trend_upper: f64,
}

/// A fitted seasonal component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalComponent {
    /// "yearly", "weekly" or "daily"
    pub name: String,
    pub period_days: f64,
    /// Component value at each prediction timestamp
    pub values: Vec<f64>,
    /// One full period sampled evenly, as `(days into period, value)`
    pub profile: Vec<(f64, f64)>,
}

/// Everything produced by fitting a model and predicting over history + horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub model: String,
    pub config: ForecastConfig,
    pub history: ForecastTable,
    pub predictions: Vec<Prediction>,
    /// Candidate changepoint timestamps
    pub changepoints: Vec<NaiveDateTime>,
    /// Changepoints whose fitted rate change passes the plotting threshold
    pub significant_changepoints: Vec<NaiveDateTime>,
    pub components: Vec<SeasonalComponent>,
}

impl ForecastResult {
    pub fn mode(&self) -> SeasonalityMode {
        self.config.seasonality_mode
    }

    /// Predictions after the last observed timestamp
    pub fn future(&self) -> &[Prediction] {
        let last = self.history.last().map(|o| o.ds);
        let start = match last {
            Some(last) => self.predictions.partition_point(|p| p.ds <= last),
            None => 0,
        };
        &self.predictions[start..]
    }
}
