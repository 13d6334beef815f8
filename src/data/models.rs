//! Tabular data models for imported and forecast-ready time series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Column name of the timestamp column in a [`ForecastTable`]
pub const DATE_COLUMN: &str = "ds";

/// Column name of the value column in a [`ForecastTable`]
pub const VALUE_COLUMN: &str = "y";

/// Format used when rendering timestamps back to text. Fractional seconds
/// are printed only when present.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A CSV file as loaded, with untyped cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        RawTable { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Names offered in the column pickers
    pub fn column_names(&self) -> &[String] {
        &self.headers
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Iterate over one column's cells; short rows yield an empty cell
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(String::as_str).unwrap_or(""))
    }
}

/// A single `(ds, y)` row of a [`ForecastTable`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub ds: NaiveDateTime,
    pub y: f64,
}

/// Two-column table ready for model fitting.
///
/// Rows are sorted by `ds` and every timestamp occurs once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    rows: Vec<Observation>,
}

impl ForecastTable {
    /// Build from rows that are already sorted and deduplicated
    pub(crate) fn from_sorted(rows: Vec<Observation>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].ds < w[1].ds));
        ForecastTable { rows }
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.rows.last()
    }

    /// Render back to text cells with `ds`/`y` headers
    pub fn to_raw(&self) -> RawTable {
        let rows = self
            .rows
            .iter()
            .map(|o| vec![o.ds.format(TIMESTAMP_FORMAT).to_string(), format_number(o.y)])
            .collect();
        RawTable::new(vec![DATE_COLUMN.to_string(), VALUE_COLUMN.to_string()], rows)
    }
}

/// Shortest text form of a value that parses back to the same f64
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_column_access_pads_short_rows() {
        let table = RawTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["3".to_string()],
            ],
        );
        let b: Vec<&str> = table.column(1).collect();
        assert_eq!(b, vec!["2", ""]);
        assert_eq!(table.column_index("b"), Some(1));
        assert_eq!(table.column_index("c"), None);
    }

    #[test]
    fn test_to_raw_uses_forecast_schema() {
        let table = ForecastTable::from_sorted(vec![
            Observation { ds: ts(1), y: 15.0 },
            Observation { ds: ts(2), y: 7.25 },
        ]);
        let raw = table.to_raw();
        assert_eq!(raw.headers, vec!["ds", "y"]);
        assert_eq!(raw.rows[0], vec!["2024-03-01 00:00:00", "15"]);
        assert_eq!(raw.rows[1], vec!["2024-03-02 00:00:00", "7.25"]);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }
}
