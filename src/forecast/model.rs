//! Decomposable trend + seasonality model.
//!
//! The series is modelled as a piecewise-linear trend whose growth rate may
//! change at a set of candidate changepoints, plus Fourier-series
//! seasonalities. Seasonal terms are either added to the trend or scale it.
//!
//! Coefficients are MAP estimates under Gaussian priors, which reduces to
//! ridge-penalised least squares:
//!
//! - rate changes: scale `changepoint_prior_scale`
//! - seasonal coefficients: scale `seasonality_prior_scale`
//! - base rate and offset: scale 5
//!
//! Penalties are relative to the noise variance, which is estimated by a
//! first pass and refined by a second.

use std::f64::consts::PI;
use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime};

use crate::data::{ForecastTable, Observation};
use crate::error::{Error, Result};

use super::config::{ForecastConfig, SeasonalityMode};
use super::linalg::{ridge_solve, Matrix};
use super::result::{ForecastResult, Prediction, SeasonalComponent};
use super::Forecaster;

const MODEL_NAME: &str = "decomposable";

/// Prior scale of the base growth rate and offset
const BASE_PRIOR_SCALE: f64 = 5.0;

/// Noise variance assumed by the first pass (scaled units)
const INITIAL_NOISE_VARIANCE: f64 = 0.01;

/// Lower bound for the estimated noise variance (scaled units)
const MIN_NOISE_VARIANCE: f64 = 1e-4;

/// Samples per period in seasonal profiles
const PROFILE_SAMPLES: usize = 120;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A Fourier seasonality: period in days and number of harmonics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    pub period_days: f64,
    pub order: usize,
}

pub const YEARLY: Seasonality = Seasonality {
    name: "yearly",
    period_days: 365.25,
    order: 10,
};

pub const WEEKLY: Seasonality = Seasonality {
    name: "weekly",
    period_days: 7.0,
    order: 3,
};

pub const DAILY: Seasonality = Seasonality {
    name: "daily",
    period_days: 1.0,
    order: 4,
};

impl Seasonality {
    fn width(&self) -> usize {
        2 * self.order
    }

    /// `[sin(2πd/P), cos(2πd/P), sin(4πd/P), ...]` for `d` days since epoch
    fn features(&self, days: f64, out: &mut Vec<f64>) {
        for i in 1..=self.order {
            let angle = 2.0 * PI * i as f64 * days / self.period_days;
            out.push(angle.sin());
            out.push(angle.cos());
        }
    }
}

/// Default [`Forecaster`]: changepoint trend plus Fourier seasonalities
#[derive(Debug, Clone)]
pub struct DecomposableForecaster {
    /// Fraction of the history in which changepoints may be placed
    pub changepoint_range: f64,
    pub max_changepoints: usize,
    /// Minimum |rate change| for a changepoint to be marked on the plot
    pub changepoint_threshold: f64,
}

impl Default for DecomposableForecaster {
    fn default() -> Self {
        DecomposableForecaster {
            changepoint_range: 0.8,
            max_changepoints: 25,
            changepoint_threshold: 0.01,
        }
    }
}

impl DecomposableForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row indices of candidate changepoints, evenly spaced over the first
    /// `changepoint_range` of the history
    pub fn changepoint_indices(&self, n: usize) -> Vec<usize> {
        let hist = (n as f64 * self.changepoint_range).floor() as usize;
        if hist < 2 {
            return Vec::new();
        }
        let count = self.max_changepoints.min(hist - 1);
        if count == 0 {
            return Vec::new();
        }
        (1..=count)
            .map(|j| (j as f64 * (hist - 1) as f64 / count as f64).round_ties_even() as usize)
            .collect()
    }
}

/// Seasonalities worth fitting for a history
pub fn detect_seasonalities(timestamps: &[NaiveDateTime]) -> Vec<Seasonality> {
    let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) else {
        return Vec::new();
    };
    let span_days = seconds(*last - *first) / SECONDS_PER_DAY;
    let min_spacing_days = timestamps
        .windows(2)
        .map(|w| seconds(w[1] - w[0]) / SECONDS_PER_DAY)
        .fold(f64::INFINITY, f64::min);

    let mut found = Vec::new();
    if span_days >= 730.0 {
        found.push(YEARLY);
    }
    if span_days >= 14.0 && min_spacing_days < 7.0 {
        found.push(WEEKLY);
    }
    if span_days >= 2.0 && min_spacing_days < 1.0 {
        found.push(DAILY);
    }
    found
}

fn seconds(delta: chrono::Duration) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

/// Fractional days since 1970-01-01
pub fn days_since_epoch(ds: NaiveDateTime) -> f64 {
    ds.and_utc().timestamp_millis() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Sunday 2017-01-01, start of every seasonal profile
fn profile_origin() -> f64 {
    NaiveDate::from_ymd_opt(2017, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(days_since_epoch)
        .unwrap_or(0.0)
}

/// Fitted coefficients in scaled units
struct Fit {
    offset: f64,
    rate: f64,
    deltas: Vec<f64>,
    /// Seasonal coefficients, one slice per seasonality
    betas: Vec<Vec<f64>>,
}

/// Maps timestamps into `[0, 1]` over the history
struct TimeScale {
    start: NaiveDateTime,
    span_secs: f64,
}

impl TimeScale {
    fn t(&self, ds: NaiveDateTime) -> f64 {
        seconds(ds - self.start) / self.span_secs
    }
}

impl Fit {
    fn trend(&self, t: f64, changepoints: &[f64]) -> f64 {
        let bends: f64 = self
            .deltas
            .iter()
            .zip(changepoints)
            .map(|(d, s)| d * (t - s).max(0.0))
            .sum();
        self.offset + self.rate * t + bends
    }

    fn seasonal(&self, seasonalities: &[Seasonality], days: f64) -> Vec<f64> {
        let mut features = Vec::new();
        seasonalities
            .iter()
            .zip(&self.betas)
            .map(|(s, beta)| {
                features.clear();
                s.features(days, &mut features);
                features.iter().zip(beta).map(|(f, b)| f * b).sum()
            })
            .collect()
    }
}

fn model_error(message: impl Into<String>) -> Error {
    Error::Model {
        model: MODEL_NAME,
        message: message.into(),
    }
}

/// Trend design columns: offset, rate, one hinge per changepoint
fn trend_row(t: f64, changepoints: &[f64], out: &mut Vec<f64>) {
    out.push(1.0);
    out.push(t);
    out.extend(changepoints.iter().map(|s| (t - s).max(0.0)));
}

fn trend_penalty(n_changepoints: usize, noise_var: f64, changepoint_prior_scale: f64) -> Vec<f64> {
    let base = noise_var / BASE_PRIOR_SCALE.powi(2);
    let delta = noise_var / changepoint_prior_scale.powi(2);
    let mut penalty = vec![base, base];
    penalty.extend(std::iter::repeat(delta).take(n_changepoints));
    penalty
}

fn residual_variance(x: &Matrix, y: &[f64], beta: &[f64]) -> f64 {
    let fitted = x.mul_vec(beta);
    let sse: f64 = fitted.iter().zip(y).map(|(f, y)| (y - f).powi(2)).sum();
    (sse / y.len() as f64).max(MIN_NOISE_VARIANCE)
}

/// Two-pass ridge fit: the second pass uses the first pass's noise estimate
fn two_pass_solve(x: &Matrix, y: &[f64], penalty_for: impl Fn(f64) -> Vec<f64>) -> Result<(Vec<f64>, f64)> {
    let first = ridge_solve(x, y, &penalty_for(INITIAL_NOISE_VARIANCE))
        .ok_or_else(|| model_error("least-squares system is not positive definite"))?;
    let noise_var = residual_variance(x, y, &first);
    let second = ridge_solve(x, y, &penalty_for(noise_var))
        .ok_or_else(|| model_error("least-squares system is not positive definite"))?;
    Ok((second, noise_var))
}

impl DecomposableForecaster {
    fn fit_coefficients(
        &self,
        t: &[f64],
        days: &[f64],
        y: &[f64],
        changepoints: &[f64],
        seasonalities: &[Seasonality],
        config: &ForecastConfig,
    ) -> Result<Fit> {
        let n_cp = changepoints.len();
        let trend_width = 2 + n_cp;
        let seasonal_width: usize = seasonalities.iter().map(Seasonality::width).sum();
        let seasonal_penalty = |noise_var: f64| noise_var / config.seasonality_prior_scale.powi(2);

        let mut row = Vec::with_capacity(trend_width + seasonal_width);
        let fill_seasonal = |days: f64, row: &mut Vec<f64>| {
            for s in seasonalities {
                s.features(days, row);
            }
        };

        let (trend_coef, seasonal_coef) = match config.seasonality_mode {
            SeasonalityMode::Additive => {
                let mut x = Matrix::zeros(t.len(), trend_width + seasonal_width);
                for i in 0..t.len() {
                    row.clear();
                    trend_row(t[i], changepoints, &mut row);
                    fill_seasonal(days[i], &mut row);
                    for (c, v) in row.iter().enumerate() {
                        x.set(i, c, *v);
                    }
                }
                let (beta, _) = two_pass_solve(&x, y, |noise_var| {
                    let mut penalty = trend_penalty(n_cp, noise_var, config.changepoint_prior_scale);
                    penalty.extend(std::iter::repeat(seasonal_penalty(noise_var)).take(seasonal_width));
                    penalty
                })?;
                let seasonal = beta[trend_width..].to_vec();
                let mut trend = beta;
                trend.truncate(trend_width);
                (trend, seasonal)
            }
            SeasonalityMode::Multiplicative => {
                // Trend alone first, then seasonal terms scaled by that trend
                let mut xt = Matrix::zeros(t.len(), trend_width);
                for i in 0..t.len() {
                    row.clear();
                    trend_row(t[i], changepoints, &mut row);
                    for (c, v) in row.iter().enumerate() {
                        xt.set(i, c, *v);
                    }
                }
                let (trend, noise_var) = two_pass_solve(&xt, y, |noise_var| {
                    trend_penalty(n_cp, noise_var, config.changepoint_prior_scale)
                })?;
                let trend_fit = xt.mul_vec(&trend);

                let seasonal = if seasonal_width == 0 {
                    Vec::new()
                } else {
                    let mut xs = Matrix::zeros(t.len(), seasonal_width);
                    let target: Vec<f64> = y.iter().zip(&trend_fit).map(|(y, tr)| y - tr).collect();
                    for i in 0..t.len() {
                        row.clear();
                        fill_seasonal(days[i], &mut row);
                        for (c, v) in row.iter().enumerate() {
                            xs.set(i, c, v * trend_fit[i]);
                        }
                    }
                    let penalty = vec![seasonal_penalty(noise_var); seasonal_width];
                    ridge_solve(&xs, &target, &penalty)
                        .ok_or_else(|| model_error("seasonal system is not positive definite"))?
                };
                (trend, seasonal)
            }
        };

        let mut betas = Vec::with_capacity(seasonalities.len());
        let mut offset = 0;
        for s in seasonalities {
            betas.push(seasonal_coef[offset..offset + s.width()].to_vec());
            offset += s.width();
        }

        Ok(Fit {
            offset: trend_coef[0],
            rate: trend_coef[1],
            deltas: trend_coef[2..].to_vec(),
            betas,
        })
    }
}

impl Forecaster for DecomposableForecaster {
    fn name(&self) -> &'static str {
        MODEL_NAME
    }

    fn fit(&self, table: &ForecastTable, config: &ForecastConfig) -> Result<ForecastResult> {
        let config = config.validated()?;
        let rows: &[Observation] = table.rows();
        if rows.len() < 2 {
            return Err(Error::InsufficientData { found: rows.len() });
        }
        if rows.iter().any(|o| !o.y.is_finite()) {
            return Err(model_error("input contains non-finite values"));
        }

        let started = Instant::now();
        let timestamps: Vec<NaiveDateTime> = rows.iter().map(|o| o.ds).collect();
        let first = timestamps[0];
        let last = timestamps[timestamps.len() - 1];
        let span_secs = seconds(last - first);
        if span_secs <= 0.0 {
            return Err(model_error("history spans zero time"));
        }
        let scale = TimeScale {
            start: first,
            span_secs,
        };

        let y_scale = rows.iter().map(|o| o.y.abs()).fold(0.0, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let t: Vec<f64> = timestamps.iter().map(|ds| scale.t(*ds)).collect();
        let days: Vec<f64> = timestamps.iter().map(|ds| days_since_epoch(*ds)).collect();
        let y: Vec<f64> = rows.iter().map(|o| o.y / y_scale).collect();

        let cp_indices = self.changepoint_indices(rows.len());
        let changepoints: Vec<f64> = cp_indices.iter().map(|&i| t[i]).collect();
        let changepoint_dates: Vec<NaiveDateTime> = cp_indices.iter().map(|&i| timestamps[i]).collect();
        let seasonalities = detect_seasonalities(&timestamps);

        let fit = self.fit_coefficients(&t, &days, &y, &changepoints, &seasonalities, &config)?;

        let significant_changepoints: Vec<NaiveDateTime> = fit
            .deltas
            .iter()
            .zip(&changepoint_dates)
            .filter(|(d, _)| d.abs() >= self.changepoint_threshold)
            .map(|(_, ds)| *ds)
            .collect();

        // Future index and predictions over history + horizon
        let future = config
            .frequency
            .future_timestamps(last, config.horizon_periods, &timestamps)?;
        let all: Vec<NaiveDateTime> = timestamps.iter().chain(future.iter()).copied().collect();

        let multiplicative = config.seasonality_mode == SeasonalityMode::Multiplicative;
        let mut trends = Vec::with_capacity(all.len());
        let mut seasonal_values: Vec<Vec<f64>> = vec![Vec::with_capacity(all.len()); seasonalities.len()];
        let mut yhats = Vec::with_capacity(all.len());
        for ds in &all {
            let trend = fit.trend(scale.t(*ds), &changepoints);
            let seasonal = fit.seasonal(&seasonalities, days_since_epoch(*ds));
            let total: f64 = seasonal.iter().sum();
            let yhat = if multiplicative {
                trend * (1.0 + total)
            } else {
                trend + total
            };
            trends.push(trend * y_scale);
            yhats.push(yhat * y_scale);
            for (k, v) in seasonal.into_iter().enumerate() {
                seasonal_values[k].push(if multiplicative { v } else { v * y_scale });
            }
        }

        // Observation noise from in-sample residuals
        let noise_sd = {
            let sse: f64 = rows
                .iter()
                .zip(&yhats)
                .map(|(o, yhat)| (o.y - yhat).powi(2))
                .sum();
            (sse / rows.len() as f64).sqrt()
        };

        // Future trend drift: changepoints recur at the historical rate with
        // the mean fitted magnitude
        let mean_abs_delta = if fit.deltas.is_empty() {
            0.0
        } else {
            fit.deltas.iter().map(|d| d.abs()).sum::<f64>() / fit.deltas.len() as f64
        };
        let changepoint_rate = fit.deltas.len() as f64;
        let trend_sd = |t: f64| -> f64 {
            let h = (t - 1.0).max(0.0);
            (2.0 * changepoint_rate * mean_abs_delta.powi(2) * h.powi(3) / 3.0).sqrt() * y_scale
        };

        let z = normal_quantile(0.5 + config.interval_width / 2.0);
        let predictions: Vec<Prediction> = all
            .iter()
            .enumerate()
            .map(|(i, ds)| {
                let drift = trend_sd(scale.t(*ds));
                let seasonal_factor = if multiplicative {
                    (1.0 + seasonal_values.iter().map(|v| v[i]).sum::<f64>()).abs()
                } else {
                    1.0
                };
                let total_sd = (noise_sd.powi(2) + (drift * seasonal_factor).powi(2)).sqrt();
                Prediction {
                    ds: *ds,
                    yhat: yhats[i],
                    yhat_lower: yhats[i] - z * total_sd,
                    yhat_upper: yhats[i] + z * total_sd,
                    trend: trends[i],
                    trend_lower: trends[i] - z * drift,
                    trend_upper: trends[i] + z * drift,
                }
            })
            .collect();

        let origin = profile_origin();
        let components: Vec<SeasonalComponent> = seasonalities
            .iter()
            .zip(seasonal_values)
            .enumerate()
            .map(|(k, (s, values))| {
                let profile = (0..PROFILE_SAMPLES)
                    .map(|i| {
                        let x = s.period_days * i as f64 / (PROFILE_SAMPLES - 1) as f64;
                        let mut features = Vec::with_capacity(s.width());
                        s.features(origin + x, &mut features);
                        let v: f64 = features.iter().zip(&fit.betas[k]).map(|(f, b)| f * b).sum();
                        (x, if multiplicative { v } else { v * y_scale })
                    })
                    .collect();
                SeasonalComponent {
                    name: s.name.to_string(),
                    period_days: s.period_days,
                    values,
                    profile,
                }
            })
            .collect();

        tracing::info!(
            model = MODEL_NAME,
            rows = rows.len(),
            horizon = config.horizon_periods,
            mode = %config.seasonality_mode,
            changepoints = changepoint_dates.len(),
            significant = significant_changepoints.len(),
            seasonalities = ?seasonalities.iter().map(|s| s.name).collect::<Vec<_>>(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fitted forecast model"
        );

        Ok(ForecastResult {
            model: MODEL_NAME.to_string(),
            config,
            history: table.clone(),
            predictions,
            changepoints: changepoint_dates,
            significant_changepoints,
            components,
        })
    }
}

/// Inverse CDF of the standard normal distribution (Acklam's approximation)
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -normal_quantile(1.0 - p)
    }
}
