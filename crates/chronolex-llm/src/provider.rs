//! # Classification Provider Trait
//!
//! Core abstraction for the AI-assisted classification tier. The entire
//! run is batched into one structured request — one round trip, not one
//! per session — and every failure mode is recoverable: the caller
//! falls back to heuristic codes for the affected sessions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type alias for classification operations.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Errors that can occur during an AI classification call.
///
/// None of these propagate out of the engine; they all degrade to the
/// heuristic tier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// No provider credentials available.
    #[error("classification provider not configured")]
    NotConfigured,

    /// HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an API error.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },

    /// The call exceeded its deadline.
    #[error("timeout after {timeout_ms}ms")]
    Timeout {
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The response was not the expected JSON shape.
    #[error("malformed response: {message}")]
    MalformedResponse {
        /// Description of the schema violation.
        message: String,
    },
}

/// A compact session summary sent to the classifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDigest {
    /// Position of the session in this run's batch.
    pub index: usize,
    /// Subject/description text to classify.
    pub text: String,
}

/// One classification tuple returned by the provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Session index this applies to.
    pub index: usize,
    /// Task code, constrained to the catalog's code set.
    pub task_code: String,
    /// Provider confidence, 0.0–1.0.
    pub confidence: f64,
}

/// A backend capable of batched structured classification.
///
/// Implementors must be `Send + Sync`; the engine holds the provider
/// behind an `Arc<dyn ClassificationProvider>`.
#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    /// Whether the provider has credentials and can be called.
    fn is_configured(&self) -> bool;

    /// Classify all sessions for a run in one request.
    ///
    /// `allowed_codes` is the catalog's code set; the provider must not
    /// return codes outside it (the caller re-validates regardless).
    async fn classify_batch(
        &self,
        sessions: &[SessionDigest],
        allowed_codes: &[&str],
    ) -> ClassifyResult<Vec<Classification>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
