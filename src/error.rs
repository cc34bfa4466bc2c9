// src/error.rs

use crate::record::JobId;
use serde_json::Error as SerdeError;
use std::io;
use thiserror::Error;

/// Custom error types for the application
#[derive(Error, Debug)]
pub enum AppError {
    /// Submitted URL was empty or whitespace-only
    #[error("URL cannot be empty")]
    EmptyUrl,

    /// Metadata resolution failed before any transfer started
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    /// Transfer failed after the probe succeeded
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    /// An operation referenced a job id that does not exist
    #[error("Unknown job id: {0}")]
    UnknownJobId(JobId),

    /// Error for missing dependencies
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] SerdeError),

    /// General application errors
    #[error("Application error: {0}")]
    General(String),
}

/// Convert a string error to AppError::General
impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::General(error)
    }
}

/// Convert a &str error to AppError::General
impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::General(error.to_string())
    }
}
