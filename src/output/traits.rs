//! Output sink trait and errors
//!
//! Records leave the crawler through a `RecordSink`. Sinks take `&self` so
//! one instance can be shared behind an `Arc` between the dispatcher and
//! whoever reads the results afterwards.

use crate::catalog::Record;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for crawl records
pub trait RecordSink: Send + Sync {
    /// Writes one record
    ///
    /// # Arguments
    ///
    /// * `record` - A summary or a finalized product record
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The record was accepted
    /// * `Err(OutputError)` - The sink could not store it
    fn write_record(&self, record: &Record) -> OutputResult<()>;

    /// Flushes anything buffered; called once after the last record
    fn finish(&self) -> OutputResult<()>;
}
