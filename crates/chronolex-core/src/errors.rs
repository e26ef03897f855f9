//! Engine error taxonomy.
//!
//! Only two failure classes abort an analysis call: a malformed window
//! and zero usable sources (both [`EngineError::Validation`]). Every
//! other failure is scoped — a connector is skipped, a classification
//! falls back, a push entry reports its own outcome — and the caller
//! still receives a structured result.

use thiserror::Error;

/// Errors surfaced from the Chronolex engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed request: inverted window, or no usable source at all.
    /// Fails the whole call immediately.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// A required connector is missing its configuration.
    ///
    /// During analysis this only skips the connector; operations that
    /// depend on a single connector (gap identification, write-back)
    /// surface it.
    #[error("connector not configured: {connector}")]
    Configuration {
        /// Name of the unconfigured connector.
        connector: String,
    },

    /// A single-source operation failed at runtime (gap identification
    /// reading the ledger). Multi-source aggregation never raises this;
    /// it isolates the failing source instead.
    #[error("source error from {name}: {message}")]
    Source {
        /// Connector name.
        name: String,
        /// Underlying failure description.
        message: String,
    },

    /// JSON (de)serialization failed at the engine boundary.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
