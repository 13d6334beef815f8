//! Forecast hyperparameters and the numeric controls that edit them.

use chrono::{Duration, Months, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How seasonal effects combine with the trend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    #[default]
    Additive,
    Multiplicative,
}

impl SeasonalityMode {
    pub const ALL: [SeasonalityMode; 2] = [SeasonalityMode::Additive, SeasonalityMode::Multiplicative];

    pub fn as_str(self) -> &'static str {
        match self {
            SeasonalityMode::Additive => "additive",
            SeasonalityMode::Multiplicative => "multiplicative",
        }
    }
}

impl std::fmt::Display for SeasonalityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step between consecutive future timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Median spacing of the history
    Auto,
    Hourly,
    #[default]
    Daily,
    Weekly,
    /// Calendar months
    Monthly,
}

impl Frequency {
    /// `periods` timestamps following `last`.
    ///
    /// `history` is only consulted for [`Frequency::Auto`]. Fails when the
    /// horizon runs past the representable date range.
    pub fn future_timestamps(
        self,
        last: NaiveDateTime,
        periods: u32,
        history: &[NaiveDateTime],
    ) -> Result<Vec<NaiveDateTime>> {
        let step = self.resolve(history);
        (1..=periods)
            .map(|i| {
                let next = match step {
                    Step::Months => last.checked_add_months(Months::new(i)),
                    Step::Fixed(step) => i32::try_from(i)
                        .ok()
                        .and_then(|i| step.checked_mul(i))
                        .and_then(|offset| last.checked_add_signed(offset)),
                };
                next.ok_or_else(|| Error::InvalidConfig {
                    field: PERIODS_SPEC.field,
                    reason: format!("{periods} periods after {last} run past the supported date range"),
                })
            })
            .collect()
    }

    fn resolve(self, history: &[NaiveDateTime]) -> Step {
        match self {
            Frequency::Hourly => Step::Fixed(Duration::hours(1)),
            Frequency::Daily => Step::Fixed(Duration::days(1)),
            Frequency::Weekly => Step::Fixed(Duration::weeks(1)),
            Frequency::Monthly => Step::Months,
            Frequency::Auto => {
                let mut spacings: Vec<i64> = history
                    .windows(2)
                    .map(|w| (w[1] - w[0]).num_seconds())
                    .filter(|s| *s > 0)
                    .collect();
                if spacings.is_empty() {
                    return Step::Fixed(Duration::days(1));
                }
                spacings.sort_unstable();
                let median = spacings[spacings.len() / 2];
                let days = median as f64 / 86_400.0;
                if (28.0..=31.0).contains(&days) {
                    Step::Months
                } else {
                    Step::Fixed(Duration::seconds(median))
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Step {
    Fixed(Duration),
    Months,
}

/// Bounds and precision of a numeric control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberSpec {
    pub field: &'static str,
    pub min: f64,
    pub max: Option<f64>,
    pub decimals: u32,
}

pub const PERIODS_SPEC: NumberSpec = NumberSpec {
    field: "periods to forecast",
    min: 1.0,
    max: Some(10_000.0),
    decimals: 0,
};

pub const CHANGEPOINT_SPEC: NumberSpec = NumberSpec {
    field: "changepoint prior scale",
    min: 0.01,
    max: None,
    decimals: 2,
};

pub const SEASONALITY_SPEC: NumberSpec = NumberSpec {
    field: "seasonality prior scale",
    min: 0.01,
    max: Some(10.0),
    decimals: 2,
};

impl NumberSpec {
    /// Round to the control's precision
    pub fn round(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.decimals as i32);
        (value * factor).round() / factor
    }

    /// Parse user text, round, and range-check
    pub fn parse(&self, text: &str) -> Result<f64> {
        let value: f64 = text.trim().parse().map_err(|_| Error::InvalidConfig {
            field: self.field,
            reason: format!("'{}' is not a number", text.trim()),
        })?;
        self.check(self.round(value))
    }

    /// Range-check an already rounded value
    pub fn check(&self, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(Error::InvalidConfig {
                field: self.field,
                reason: "must be finite".to_string(),
            });
        }
        if value < self.min {
            return Err(Error::InvalidConfig {
                field: self.field,
                reason: format!("{value} is below the minimum {}", self.min),
            });
        }
        if let Some(max) = self.max {
            if value > max {
                return Err(Error::InvalidConfig {
                    field: self.field,
                    reason: format!("{value} is above the maximum {max}"),
                });
            }
        }
        Ok(value)
    }

    /// Display a value with the control's precision
    pub fn format(&self, value: f64) -> String {
        format!("{value:.prec$}", prec = self.decimals as usize)
    }
}

/// Default width of the uncertainty interval
pub const DEFAULT_INTERVAL_WIDTH: f64 = 0.80;

/// User-editable forecast parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    pub horizon_periods: u32,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub seasonality_mode: SeasonalityMode,
    pub frequency: Frequency,
    pub interval_width: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            horizon_periods: 24,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            seasonality_mode: SeasonalityMode::Additive,
            frequency: Frequency::Daily,
            interval_width: DEFAULT_INTERVAL_WIDTH,
        }
    }
}

impl ForecastConfig {
    /// Build a validated config; prior scales are rounded to two decimals
    pub fn new(
        horizon_periods: u32,
        changepoint_prior_scale: f64,
        seasonality_prior_scale: f64,
        seasonality_mode: SeasonalityMode,
    ) -> Result<Self> {
        ForecastConfig {
            horizon_periods,
            changepoint_prior_scale: CHANGEPOINT_SPEC.round(changepoint_prior_scale),
            seasonality_prior_scale: SEASONALITY_SPEC.round(seasonality_prior_scale),
            seasonality_mode,
            ..ForecastConfig::default()
        }
        .validated()
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_interval_width(mut self, interval_width: f64) -> Result<Self> {
        self.interval_width = interval_width;
        self.validated()
    }

    /// Check every field against its bounds
    pub fn validated(self) -> Result<Self> {
        PERIODS_SPEC.check(f64::from(self.horizon_periods))?;
        CHANGEPOINT_SPEC.check(self.changepoint_prior_scale)?;
        SEASONALITY_SPEC.check(self.seasonality_prior_scale)?;
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(Error::InvalidConfig {
                field: "interval width",
                reason: format!("{} is not strictly between 0 and 1", self.interval_width),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ForecastConfig::default().validated().unwrap();
        assert_eq!(config.horizon_periods, 24);
        assert_eq!(config.changepoint_prior_scale, 0.05);
        assert_eq!(config.seasonality_prior_scale, 10.0);
        assert_eq!(config.seasonality_mode, SeasonalityMode::Additive);
        assert_eq!(config.frequency, Frequency::Daily);
    }

    #[test]
    fn test_horizon_bounds() {
        let mode = SeasonalityMode::Additive;
        assert!(ForecastConfig::new(1, 0.05, 10.0, mode).is_ok());
        assert!(ForecastConfig::new(10_000, 0.05, 10.0, mode).is_ok());

        let err = ForecastConfig::new(0, 0.05, 10.0, mode).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(ForecastConfig::new(10_001, 0.05, 10.0, mode).is_err());
    }

    #[test]
    fn test_prior_scale_bounds() {
        let mode = SeasonalityMode::Multiplicative;
        assert!(ForecastConfig::new(24, 0.001, 10.0, mode).is_err());
        assert!(ForecastConfig::new(24, 50.0, 10.0, mode).is_ok());
        assert!(ForecastConfig::new(24, 0.05, 10.5, mode).is_err());
        assert!(ForecastConfig::new(24, 0.05, 0.0, mode).is_err());
    }

    #[test]
    fn test_prior_scales_rounded_to_two_decimals() {
        let config = ForecastConfig::new(24, 0.123, 4.567, SeasonalityMode::Additive).unwrap();
        assert_eq!(config.changepoint_prior_scale, 0.12);
        assert_eq!(config.seasonality_prior_scale, 4.57);
    }

    #[test]
    fn test_interval_width_bounds() {
        assert!(ForecastConfig::default().with_interval_width(0.95).is_ok());
        assert!(ForecastConfig::default().with_interval_width(1.0).is_err());
        assert!(ForecastConfig::default().with_interval_width(0.0).is_err());
    }

    #[test]
    fn test_number_spec_parse() {
        assert_eq!(PERIODS_SPEC.parse(" 36 ").unwrap(), 36.0);
        assert_eq!(PERIODS_SPEC.parse("12.4").unwrap(), 12.0);
        assert!(PERIODS_SPEC.parse("0").is_err());
        assert!(PERIODS_SPEC.parse("10001").is_err());
        assert!(PERIODS_SPEC.parse("abc").is_err());
        assert_eq!(SEASONALITY_SPEC.parse("0.016").unwrap(), 0.02);
        assert!(SEASONALITY_SPEC.parse("0.004").is_err());
        assert_eq!(CHANGEPOINT_SPEC.format(0.5), "0.50");
        assert_eq!(PERIODS_SPEC.format(24.0), "24");
    }

    #[test]
    fn test_daily_future_timestamps() {
        let future = Frequency::Daily.future_timestamps(at(2020, 1, 2), 3, &[]).unwrap();
        assert_eq!(future, vec![at(2020, 1, 3), at(2020, 1, 4), at(2020, 1, 5)]);
    }

    #[test]
    fn test_monthly_future_timestamps_follow_calendar() {
        let future = Frequency::Monthly.future_timestamps(at(2021, 1, 31), 2, &[]).unwrap();
        assert_eq!(future, vec![at(2021, 2, 28), at(2021, 3, 31)]);
    }

    #[test]
    fn test_auto_frequency_uses_median_spacing() {
        let weekly = [at(2020, 1, 1), at(2020, 1, 8), at(2020, 1, 15), at(2020, 1, 29)];
        let future = Frequency::Auto.future_timestamps(at(2020, 1, 29), 1, &weekly).unwrap();
        assert_eq!(future, vec![at(2020, 2, 5)]);

        let monthly = [at(2020, 1, 1), at(2020, 2, 1), at(2020, 3, 1)];
        let future = Frequency::Auto.future_timestamps(at(2020, 3, 1), 1, &monthly).unwrap();
        assert_eq!(future, vec![at(2020, 4, 1)]);
    }

    #[test]
    fn test_future_past_date_range_is_rejected() {
        let centuries = [at(1800, 1, 1), at(1900, 1, 1), at(2000, 1, 1)];
        let err = Frequency::Auto
            .future_timestamps(at(2000, 1, 1), 10_000, &centuries)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = Frequency::Monthly
            .future_timestamps(NaiveDateTime::MAX, 1, &[])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
