//! Error types for the FedHealth diagnostic client
//!
//! All errors are session-local and recoverable by retrying the triggering
//! user action; nothing here is fatal to the process.

use thiserror::Error;

/// Result type for diagnostic client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Diagnostic client errors
#[derive(Debug, Error)]
pub enum Error {
    /// Module id is not registered in the catalog
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    /// Required field missing or failed numeric coercion; caught before any
    /// network call
    #[error("Invalid payload field: {0}")]
    InvalidPayload(String),

    /// Mandatory result call failed (network error or non-success status)
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// Report generation failed; scoped to the report sub-flow only
    #[error("Report generation failed: {0}")]
    ReportFailed(String),

    /// Chat endpoint unreachable or returned an error
    #[error("Chat service unavailable")]
    ChatUnavailable,

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
