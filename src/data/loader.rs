//! CSV loading into a [`RawTable`].
//!
//! The loader only checks structure: a header row must exist and every
//! record must have as many fields as the header. Cell types are left to
//! the column mapper.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::models::RawTable;

/// Expand a leading `~` to the user's home directory
pub fn expand_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    if trimmed == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(trimmed)
}

/// Load a CSV file from disk
pub fn load_csv(path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_csv(file, &path.display().to_string())?;
    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded CSV"
    );
    Ok(table)
}

/// Parse CSV content from any reader; `source_name` is used in error messages
pub fn parse_csv<R: Read>(reader: R, source_name: &str) -> Result<RawTable> {
    let csv_error = |e: csv::Error| Error::CsvParse {
        source_name: source_name.to_string(),
        message: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_error)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(Error::EmptyCsv {
            source_name: source_name.to_string(),
        });
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(dedupe_headers(headers), rows))
}

/// Make repeated header names unique by suffixing `.1`, `.2`, ...
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut result = Vec::with_capacity(headers.len());

    for header in headers {
        let mut name = header.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{header}.{suffix}");
            suffix += 1;
        }
        seen.insert(name.clone());
        result.push(name);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn test_parse_csv_rows_and_headers() {
        let csv = "day,sales,store\n2020-01-01,10,a\n2020-01-01,5,b\n2020-01-02,7,a\n";
        let table = parse_csv(csv.as_bytes(), "inline").unwrap();
        assert_eq!(table.headers, vec!["day", "sales", "store"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[2], vec!["2020-01-02", "7", "a"]);
    }

    #[test]
    fn test_header_only_csv_has_no_rows() {
        let table = parse_csv("day,sales\n".as_bytes(), "inline").unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_ragged_rows_are_parse_errors() {
        let csv = "day,sales\n2020-01-01,10\n2020-01-02\n";
        let err = parse_csv(csv.as_bytes(), "inline").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(err, Error::CsvParse { .. }));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        let err = parse_csv("".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, Error::EmptyCsv { .. }));
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let bytes: &[u8] = b"day,sales\n2020-01-01,\xff\xfe\n";
        let err = parse_csv(bytes, "inline").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_duplicate_headers_are_renamed() {
        let csv = "a,b,a,a\n1,2,3,4\n";
        let table = parse_csv(csv.as_bytes(), "inline").unwrap();
        assert_eq!(table.headers, vec!["a", "b", "a.1", "a.2"]);
    }

    #[test]
    fn test_bom_is_stripped_from_first_header() {
        let csv = "\u{feff}day,sales\n2020-01-01,1\n";
        let table = parse_csv(csv.as_bytes(), "inline").unwrap();
        assert_eq!(table.headers[0], "day");
    }

    #[test]
    fn test_quoted_fields() {
        let csv = "day,\"sales, total\"\n2020-01-01,\"1,5\"\n";
        let table = parse_csv(csv.as_bytes(), "inline").unwrap();
        assert_eq!(table.headers[1], "sales, total");
        assert_eq!(table.rows[0][1], "1,5");
    }

    #[test]
    fn test_load_csv_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ds,y").unwrap();
        writeln!(file, "2021-05-01,1.5").unwrap();
        writeln!(file, "2021-05-02,2.5").unwrap();
        file.flush().unwrap();

        let table = load_csv(file.path()).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), &["ds".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_csv(&dir.path().join("missing.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("  data.csv "), PathBuf::from("data.csv"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/data.csv"), home.join("data.csv"));
            assert_eq!(expand_path("~"), home);
        }
    }
}
