//! Suggested filename extraction from a Content-Disposition header value.
//!
//! Only the positional form the upload endpoint produces is understood:
//! the second `;` segment holds `filename=value`, optionally quoted.
//! There is no fallback name.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispositionError {
    #[error("response has no Content-Disposition header")]
    Missing,
    #[error("Content-Disposition header is not valid text")]
    NotText,
    #[error("Content-Disposition header {0:?} has no parameter segment")]
    NoParameter(String),
    #[error("Content-Disposition parameter {0:?} has no value")]
    NoValue(String),
}

/// Extracts the filename from the second `;` segment of `header_value`.
///
/// The segment is split on `=` and the second piece is taken with every `"`
/// removed, so `attachment; filename="result.csv"` yields `result.csv`.
pub fn suggested_filename(header_value: &str) -> Result<String, DispositionError> {
    let parameter = header_value
        .split(';')
        .nth(1)
        .ok_or_else(|| DispositionError::NoParameter(header_value.to_string()))?;

    let value = parameter
        .split('=')
        .nth(1)
        .ok_or_else(|| DispositionError::NoValue(parameter.to_string()))?;

    Ok(value.replace('"', ""))
}
