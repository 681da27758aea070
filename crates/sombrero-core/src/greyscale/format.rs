//! Reader and writer for the `values` lines of compilation and fixture files.
//!
//! A present series is stored as `values = S'<v1>, <v2>, ...'`; a scan whose
//! series is missing carries a line holding only the bare `values` token.
//! Every other line is opaque to this module.

use super::text::{format_greyscale_value, split_lines};
use crate::domain::{MeasurementSeries, ScanRecord, SombreroError, SombreroResult};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const VALUES_MARKER: &str = "values";
pub const VALUES_PREFIX: &str = "values = ";
const CONTAINER_OPEN: &str = "S'";
const CONTAINER_CLOSE: &str = "'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// A `values = S'...'` line; carries the text after `values = `.
    Series(&'a str),
    MissingMarker,
    Opaque,
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    let stripped = line.trim();
    if stripped == VALUES_MARKER {
        return LineKind::MissingMarker;
    }
    match stripped.strip_prefix(VALUES_PREFIX) {
        Some(payload) if payload.starts_with(CONTAINER_OPEN) => LineKind::Series(payload),
        _ => LineKind::Opaque,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesDecodeError {
    #[error("expected an S'...' value container, found '{0}'")]
    MissingContainer(String),
    #[error("value container is empty")]
    Empty,
    #[error("invalid greyscale value '{value}' at position {position}")]
    InvalidValue { value: String, position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line_number}: {source}")]
pub struct FormatError {
    pub line_number: usize,
    #[source]
    pub source: SeriesDecodeError,
}

pub fn decode_series(payload: &str) -> Result<MeasurementSeries, SeriesDecodeError> {
    let inner = payload
        .trim()
        .strip_prefix(CONTAINER_OPEN)
        .and_then(|rest| rest.strip_suffix(CONTAINER_CLOSE))
        .ok_or_else(|| SeriesDecodeError::MissingContainer(payload.trim().to_string()))?;

    let mut tokens: Vec<&str> = inner.split(',').map(str::trim).collect();
    if tokens.len() > 1 && tokens.last().is_some_and(|token| token.is_empty()) {
        tokens.pop();
    }
    if tokens.iter().all(|token| token.is_empty()) {
        return Err(SeriesDecodeError::Empty);
    }

    tokens
        .into_iter()
        .enumerate()
        .map(|(position, token)| {
            token
                .parse::<f64>()
                .map_err(|_| SeriesDecodeError::InvalidValue {
                    value: token.to_string(),
                    position,
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(MeasurementSeries::new)
}

pub fn encode_series(series: &MeasurementSeries) -> String {
    let rendered = series
        .iter()
        .map(format_greyscale_value)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{VALUES_PREFIX}{CONTAINER_OPEN}{rendered}{CONTAINER_CLOSE}")
}

pub fn parse_scan_records(content: &str) -> Result<Vec<ScanRecord>, FormatError> {
    let mut records = Vec::new();
    for (index, line) in split_lines(content).iter().enumerate() {
        let line_number = index + 1;
        match classify_line(line.content) {
            LineKind::Series(payload) => {
                let series = decode_series(payload).map_err(|source| FormatError {
                    line_number,
                    source,
                })?;
                records.push(ScanRecord::Present {
                    line_number,
                    series,
                });
            }
            LineKind::MissingMarker => records.push(ScanRecord::Missing { line_number }),
            LineKind::Opaque => {}
        }
    }
    Ok(records)
}

/// All present series in file order, or `None` when the content holds none.
pub fn read_series(content: &str) -> Result<Option<Vec<MeasurementSeries>>, FormatError> {
    let series = parse_scan_records(content)?
        .into_iter()
        .filter_map(|record| match record {
            ScanRecord::Present { series, .. } => Some(series),
            ScanRecord::Missing { .. } => None,
        })
        .collect::<Vec<_>>();

    Ok((!series.is_empty()).then_some(series))
}

/// Only the first series line is decoded; later lines are not looked at.
pub fn first_series(content: &str) -> Result<Option<MeasurementSeries>, FormatError> {
    for (index, line) in split_lines(content).iter().enumerate() {
        if let LineKind::Series(payload) = classify_line(line.content) {
            return decode_series(payload)
                .map(Some)
                .map_err(|source| FormatError {
                    line_number: index + 1,
                    source,
                });
        }
    }
    Ok(None)
}

pub fn read_series_from_fixture(path: &Path) -> SombreroResult<Option<MeasurementSeries>> {
    let content = read_greyscale_source(path, "fixture config")?;
    first_series(&content).map_err(|error| format_error(path, error))
}

pub fn read_series_from_compilation(
    path: &Path,
) -> SombreroResult<Option<Vec<MeasurementSeries>>> {
    let content = read_greyscale_source(path, "compilation")?;
    read_series(&content).map_err(|error| format_error(path, error))
}

pub(crate) fn read_greyscale_source(path: &Path, artifact: &str) -> SombreroResult<String> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            SombreroError::not_found(
                "NOT_FOUND.GREYSCALE_SOURCE",
                format!("no {} file found at '{}'", artifact, path.display()),
            )
        } else {
            SombreroError::io_system(
                "IO.GREYSCALE_SOURCE_READ",
                format!("failed to read {} '{}': {}", artifact, path.display(), source),
            )
        }
    })
}

pub(crate) fn format_error(path: &Path, error: FormatError) -> SombreroError {
    SombreroError::input_validation(
        "INPUT.GREYSCALE_FORMAT",
        format!("malformed greyscale values in '{}' {}", path.display(), error),
    )
}
