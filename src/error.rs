// Crate error type. Pure components (generator, aggregation) fail fast with
// these variants; binaries and I/O glue wrap them in anyhow.

use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Metric type name outside the fixed enumeration, or missing from a generator table.
    #[error("invalid metric_type: {0}")]
    InvalidMetricType(String),

    /// Query window with `from` after `to`.
    #[error("invalid range: from {from} is after to {to}")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// Sample value that is negative, NaN or infinite, or an empty service id.
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// True for errors caused by caller input (mapped to 400 by the HTTP layer).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidMetricType(_) | Error::InvalidRange { .. } | Error::InvalidSample(_)
        )
    }
}
