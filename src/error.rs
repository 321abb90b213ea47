//! Fatal, run-aborting errors.
//!
//! Per-hero fetch failures and per-record upload failures are not here: they
//! are recorded in the run or the upload totals and the run carries on.

use crate::upload::SinkError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read config {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("progress file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no scraped data at {0}; run `scrape` first")]
    NoScrapedData(PathBuf),

    #[error("upload sink unavailable: {0}")]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
