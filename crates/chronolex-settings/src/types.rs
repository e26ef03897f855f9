//! Settings structs with compiled defaults.
//!
//! Grouped by concern: engine tuning, AI classification, mailbox, and
//! ledger endpoints. Credentials (IMAP password, ledger token, AI API
//! key) are env-only — they are never written to or read from the
//! settings file body by the engine itself, but a user file may supply
//! them for development setups.

use serde::{Deserialize, Serialize};

/// Engine tuning knobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Gap (minutes) that splits two events into separate sessions.
    pub session_gap_minutes: i64,
    /// Per-connector fetch deadline in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Day threshold (minutes) below which a billing gap is reported.
    pub gap_threshold_minutes: f64,
    /// Duration quantum (minutes) assigned to each mail message.
    pub mail_duration_minutes: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            session_gap_minutes: 30,
            fetch_timeout_ms: 30_000,
            gap_threshold_minutes: 120.0,
            mail_duration_minutes: 6.0,
        }
    }
}

/// AI classification settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// Base URL of the classification API.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key; usually supplied via `CHRONOLEX_LLM_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Request deadline in milliseconds.
    pub timeout_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key: None,
            timeout_ms: 20_000,
        }
    }
}

/// Mailbox (IMAP) endpoint settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MailboxSettings {
    /// IMAP host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// IMAP TLS port.
    pub port: u16,
    /// Account username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Account password; usually supplied via `CHRONOLEX_IMAP_PASSWORD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Mailbox folder to search.
    pub folder: String,
}

impl Default for MailboxSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: 993,
            username: None,
            password: None,
            folder: "INBOX".to_string(),
        }
    }
}

/// Practice-management ledger endpoint settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    /// Base URL of the ledger REST API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Bearer token; usually supplied via `CHRONOLEX_LEDGER_TOKEN`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

/// Top-level settings value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChronolexSettings {
    /// Engine tuning.
    pub engine: EngineSettings,
    /// AI classification.
    pub llm: LlmSettings,
    /// Mailbox endpoint.
    pub mailbox: MailboxSettings,
    /// Ledger endpoint.
    pub ledger: LedgerSettings,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
