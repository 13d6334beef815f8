//! Chart-ready series derived from a [`ForecastResult`].
//!
//! Time is expressed as fractional days since 1970-01-01 so every series
//! can be handed straight to a chart widget.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::config::SeasonalityMode;
use super::model::days_since_epoch;
use super::result::ForecastResult;

/// Forecast with observed history, intervals and changepoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastPlot {
    pub observed: Vec<(f64, f64)>,
    pub yhat: Vec<(f64, f64)>,
    pub lower: Vec<(f64, f64)>,
    pub upper: Vec<(f64, f64)>,
    pub trend: Vec<(f64, f64)>,
    /// x positions of significant changepoints
    pub changepoints: Vec<f64>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

/// One seasonal component over a single period
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalPanel {
    pub name: String,
    pub period_days: f64,
    pub points: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Values are fractions of the trend
    pub percent: bool,
}

impl SeasonalPanel {
    /// Axis labels spread evenly over the period
    pub fn x_labels(&self) -> Vec<String> {
        match self.name.as_str() {
            "weekly" => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
                .map(String::from)
                .to_vec(),
            "yearly" => ["Jan", "Apr", "Jul", "Oct", "Jan"].map(String::from).to_vec(),
            "daily" => ["00:00", "06:00", "12:00", "18:00", "24:00"].map(String::from).to_vec(),
            _ => vec![
                "0".to_string(),
                format!("{:.1}", self.period_days / 2.0),
                format!("{:.1}", self.period_days),
            ],
        }
    }
}

/// Trend over time plus one panel per seasonality
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentsPlot {
    pub trend: Vec<(f64, f64)>,
    pub trend_lower: Vec<(f64, f64)>,
    pub trend_upper: Vec<(f64, f64)>,
    pub trend_x_bounds: [f64; 2],
    pub trend_y_bounds: [f64; 2],
    pub seasonal: Vec<SeasonalPanel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotArtifacts {
    pub forecast: ForecastPlot,
    pub components: ComponentsPlot,
}

/// Prepare both charts for a forecast
pub fn build_plots(result: &ForecastResult) -> PlotArtifacts {
    let observed: Vec<(f64, f64)> = result
        .history
        .rows()
        .iter()
        .map(|o| (days_since_epoch(o.ds), o.y))
        .collect();

    let series = |f: fn(&super::result::Prediction) -> f64| -> Vec<(f64, f64)> {
        result
            .predictions
            .iter()
            .map(|p| (days_since_epoch(p.ds), f(p)))
            .collect()
    };

    let yhat = series(|p| p.yhat);
    let lower = series(|p| p.yhat_lower);
    let upper = series(|p| p.yhat_upper);
    let trend = series(|p| p.trend);
    let trend_lower = series(|p| p.trend_lower);
    let trend_upper = series(|p| p.trend_upper);

    let x_bounds = bounds(observed.iter().chain(&yhat).map(|(x, _)| *x), 0.0);
    let y_bounds = bounds(
        observed
            .iter()
            .chain(&lower)
            .chain(&upper)
            .map(|(_, y)| *y),
        0.05,
    );

    let changepoints = result
        .significant_changepoints
        .iter()
        .map(|ds| days_since_epoch(*ds))
        .collect();

    let percent = result.mode() == SeasonalityMode::Multiplicative;
    let seasonal = result
        .components
        .iter()
        .map(|c| {
            let points: Vec<(f64, f64)> = c
                .profile
                .iter()
                .map(|(x, v)| (*x, if percent { v * 100.0 } else { *v }))
                .collect();
            SeasonalPanel {
                name: c.name.clone(),
                period_days: c.period_days,
                y_bounds: bounds(points.iter().map(|(_, y)| *y), 0.05),
                x_bounds: [0.0, c.period_days],
                points,
                percent,
            }
        })
        .collect();

    let trend_x_bounds = bounds(trend.iter().map(|(x, _)| *x), 0.0);
    let trend_y_bounds = bounds(
        trend_lower.iter().chain(&trend_upper).map(|(_, y)| *y),
        0.05,
    );

    PlotArtifacts {
        forecast: ForecastPlot {
            observed,
            yhat,
            lower,
            upper,
            trend: trend.clone(),
            changepoints,
            x_bounds,
            y_bounds,
        },
        components: ComponentsPlot {
            trend,
            trend_lower,
            trend_upper,
            trend_x_bounds,
            trend_y_bounds,
            seasonal,
        },
    }
}

/// Min/max of finite values with `padding` (fraction of the range) each side.
/// Degenerate ranges are widened to one unit.
fn bounds(values: impl Iterator<Item = f64>, padding: f64) -> [f64; 2] {
    let (mut min, mut max) = values
        .filter(|v| v.is_finite())
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        return [0.0, 1.0];
    }
    if min >= max {
        max = min + 1.0;
    }
    let range = max - min;
    min -= range * padding;
    max += range * padding;
    [min, max]
}

/// Calendar date for an x position
pub fn date_from_days(days: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let millis = (days * 86_400_000.0).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }
    epoch.checked_add_signed(Duration::milliseconds(millis as i64))
}

/// Axis label for an x position; includes the time when the span is short
pub fn format_date_label(days: f64, span_days: f64) -> String {
    match date_from_days(days) {
        Some(ds) if span_days < 3.0 => ds.format("%m-%d %H:%M").to_string(),
        Some(ds) => ds.format("%Y-%m-%d").to_string(),
        None => format!("{days:.0}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{map_columns, RawTable};
    use crate::forecast::{DecomposableForecaster, ForecastConfig, Forecaster};

    fn daily_result(days: usize, mode: SeasonalityMode) -> ForecastResult {
        let rows = (0..days)
            .map(|d| {
                let ds = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + Duration::days(d as i64);
                let weekly = [1.0, 3.0, 3.0, 3.0, 3.0, 3.0, 0.5][d % 7];
                vec![ds.format("%Y-%m-%d").to_string(), (20.0 + d as f64 + weekly).to_string()]
            })
            .collect();
        let raw = RawTable::new(vec!["date".into(), "value".into()], rows);
        let table = map_columns(&raw, "date", "value").unwrap();
        let config = ForecastConfig::new(14, 0.05, 10.0, mode).unwrap();
        DecomposableForecaster::new().fit(&table, &config).unwrap()
    }

    #[test]
    fn test_forecast_plot_series_lengths() {
        let result = daily_result(60, SeasonalityMode::Additive);
        let plots = build_plots(&result);
        let forecast = &plots.forecast;

        assert_eq!(forecast.observed.len(), 60);
        assert_eq!(forecast.yhat.len(), 74);
        assert_eq!(forecast.lower.len(), 74);
        assert_eq!(forecast.upper.len(), 74);
        assert_eq!(forecast.changepoints.len(), result.significant_changepoints.len());
        assert!(forecast.x_bounds[0] < forecast.x_bounds[1]);
        assert!(forecast.y_bounds[0] < forecast.y_bounds[1]);

        // Every interval point lies inside the y bounds
        for (_, y) in forecast.lower.iter().chain(&forecast.upper) {
            assert!(*y >= forecast.y_bounds[0] && *y <= forecast.y_bounds[1]);
        }
    }

    #[test]
    fn test_component_panels() {
        let result = daily_result(60, SeasonalityMode::Additive);
        let plots = build_plots(&result);
        assert_eq!(plots.components.trend.len(), 74);
        assert_eq!(plots.components.seasonal.len(), 1);

        let weekly = &plots.components.seasonal[0];
        assert_eq!(weekly.name, "weekly");
        assert_eq!(weekly.x_bounds, [0.0, 7.0]);
        assert!(!weekly.percent);
        // One label per day boundary, ending on the following Sunday
        let labels = weekly.x_labels();
        assert_eq!(labels.len(), 8);
        assert_eq!(labels.first().map(String::as_str), Some("Sun"));
        assert_eq!(labels[3], "Wed");
        assert_eq!(labels.last().map(String::as_str), Some("Sun"));
    }

    #[test]
    fn test_multiplicative_panels_are_percent() {
        let result = daily_result(60, SeasonalityMode::Multiplicative);
        let plots = build_plots(&result);
        let weekly = &plots.components.seasonal[0];
        assert!(weekly.percent);
        let profile_max = result.components[0]
            .profile
            .iter()
            .map(|(_, v)| v.abs())
            .fold(0.0, f64::max);
        let panel_max = weekly.points.iter().map(|(_, v)| v.abs()).fold(0.0, f64::max);
        assert!((panel_max - profile_max * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_handles_degenerate_input() {
        assert_eq!(bounds(std::iter::empty(), 0.05), [0.0, 1.0]);
        assert_eq!(bounds([3.0, 3.0].into_iter(), 0.0), [3.0, 4.0]);
        assert_eq!(bounds([0.0, 10.0, f64::NAN].into_iter(), 0.1), [-1.0, 11.0]);
    }

    #[test]
    fn test_date_labels() {
        let day = days_since_epoch(
            NaiveDate::from_ymd_opt(2024, 2, 29)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
        );
        assert_eq!(format_date_label(day, 100.0), "2024-02-29");
        assert_eq!(format_date_label(day, 1.0), "02-29 06:00");
    }
}
