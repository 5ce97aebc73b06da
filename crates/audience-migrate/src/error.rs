//! Error types for audience-migrate.
//!
//! Only [`Error::Config`] is fatal for a run. Every other variant is produced by
//! a single request and recovered locally by the pipeline.

use thiserror::Error;

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading configuration or talking to the API.
///
/// Each message starts with a stable `MIGRATE-xxx` code.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (MIGRATE-001).
    #[error("[MIGRATE-001] Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failure (MIGRATE-002).
    #[error("[MIGRATE-002] HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials rejected by the API (MIGRATE-003).
    #[error("[MIGRATE-003] Authentication failed: {0}")]
    Authentication(String),

    /// Non-success status returned by the API (MIGRATE-004).
    #[error("[MIGRATE-004] API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Response body could not be decoded (MIGRATE-005).
    #[error("[MIGRATE-005] Failed to decode response: {0}")]
    Decode(String),
}

impl Error {
    /// Returns true for errors raised while loading or validating configuration.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
