// Error taxonomy for the dashboard pipeline
//
// DataLoadError is fatal: without a table there is nothing to show.
// FilterError is recoverable: the caller falls back to the unfiltered table.
// An empty filter result is NOT an error (see aggregate::ViewData::NoData).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read data source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' is missing from the header")]
    MissingColumn(&'static str),

    #[error("line {line}: invalid date '{value}' (expected day-first, e.g. 31/01/2024)")]
    InvalidDate { line: u64, value: String },

    #[error("line {line}: invalid amount '{value}'")]
    InvalidAmount { line: u64, value: String },

    #[error("line {line}: invalid quantity '{value}'")]
    InvalidQuantity { line: u64, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("invalid date bound '{0}'")]
    InvalidDate(String),
}

/// A view name that matches none of the dashboard tabs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown view '{0}'")]
pub struct UnknownView(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_view_message() {
        let err: Box<dyn std::error::Error> = Box::new(UnknownView("maps".to_string()));
        assert_eq!(err.to_string(), "unknown view 'maps'");
    }
}
