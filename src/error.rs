use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single field extraction.
///
/// These never leave the extractor boundary: the executor logs them and
/// turns them into a missing marker for the field.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// A configured CSS selector could not be compiled
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A selector matched nothing in its scope
    #[error("no element matches `{selector}`")]
    NotFound { selector: String },

    /// An element was found but lacks a required attribute
    #[error("<{element}> has no `{attribute}` attribute")]
    MissingAttribute { element: String, attribute: String },

    /// Two lists that must be paired have different lengths
    #[error("axis/series length mismatch: {labels} labels, {values} values")]
    LengthMismatch { labels: usize, values: usize },

    /// Fewer than two usable y-axis labels
    #[error("insufficient axis calibration points: found {found}, need 2")]
    InsufficientCalibration { found: usize },

    /// Both calibration extremes sit on the same pixel row
    #[error("degenerate axis: calibration points share pixel {pixel}")]
    DegenerateAxis { pixel: f64 },
}

/// Errors that abort a batch run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no HTML files found in {}", dir.display())]
    NoInputs { dir: PathBuf },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

/// Formats an error and its `source()` chain, innermost last.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
