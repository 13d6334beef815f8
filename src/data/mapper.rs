//! Column mapping from a [`RawTable`] into a [`ForecastTable`].
//!
//! Projects the chosen date and value columns, parses them, and sums values
//! that share a timestamp.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

use super::models::{ForecastTable, Observation, RawTable};

/// Date-time layouts tried in order after RFC 3339
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts, interpreted at midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

/// Parse a timestamp cell. Returns `None` when no layout matches.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    // Year-month, e.g. "2021-07"
    if value.len() == 7 {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Parse a value cell. Empty and NaN cells are missing (`Ok(None)`).
fn parse_value(value: &str) -> std::result::Result<Option<f64>, ()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(()),
    }
}

fn require_column(raw: &RawTable, column: &str) -> Result<usize> {
    raw.column_index(column).ok_or_else(|| Error::ColumnNotFound {
        column: column.to_string(),
        available: raw.headers.join(", "),
    })
}

/// Build a [`ForecastTable`] from two columns of a [`RawTable`].
///
/// Rows with an empty date are dropped. Missing values count as zero in
/// their timestamp's sum. Row numbers in errors are 1-based data rows.
pub fn map_columns(raw: &RawTable, date_column: &str, value_column: &str) -> Result<ForecastTable> {
    let date_idx = require_column(raw, date_column)?;
    let value_idx = require_column(raw, value_column)?;
    if date_idx == value_idx {
        return Err(Error::SameColumn {
            column: date_column.to_string(),
        });
    }

    let mut grouped: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
    let mut dropped = 0usize;

    for (i, (date_cell, value_cell)) in raw.column(date_idx).zip(raw.column(value_idx)).enumerate() {
        let row = i + 1;

        if date_cell.trim().is_empty() {
            dropped += 1;
            continue;
        }

        let ds = parse_timestamp(date_cell).ok_or_else(|| Error::DateParse {
            column: date_column.to_string(),
            row,
            value: date_cell.to_string(),
        })?;

        let y = parse_value(value_cell).map_err(|_| Error::ValueParse {
            column: value_column.to_string(),
            row,
            value: value_cell.to_string(),
        })?;

        *grouped.entry(ds).or_insert(0.0) += y.unwrap_or(0.0);
    }

    let rows: Vec<Observation> = grouped
        .into_iter()
        .map(|(ds, y)| Observation { ds, y })
        .collect();

    tracing::info!(
        date_column,
        value_column,
        input_rows = raw.row_count(),
        timestamps = rows.len(),
        dropped,
        "mapped columns"
    );

    Ok(ForecastTable::from_sorted(rows))
}
