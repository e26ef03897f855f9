//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ChronolexSettings::default()`]
//! 2. If `~/.chronolex/settings.json` exists, deep-merge user values
//!    over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ChronolexSettings;

/// Resolve the path to the settings file (`~/.chronolex/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".chronolex").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ChronolexSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ChronolexSettings> {
    let defaults = serde_json::to_value(ChronolexSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ChronolexSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules; invalid values are silently
/// ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut ChronolexSettings) {
    // ── Engine tuning ───────────────────────────────────────────────
    if let Some(v) = read_env_i64("CHRONOLEX_SESSION_GAP_MINUTES", 1, 1440) {
        settings.engine.session_gap_minutes = v;
    }
    if let Some(v) = read_env_u64("CHRONOLEX_FETCH_TIMEOUT_MS", 1000, 600_000) {
        settings.engine.fetch_timeout_ms = v;
    }
    if let Some(v) = read_env_f64("CHRONOLEX_GAP_THRESHOLD_MINUTES", 0.0, 1440.0) {
        settings.engine.gap_threshold_minutes = v;
    }

    // ── AI classification ───────────────────────────────────────────
    if let Some(v) = read_env_string("CHRONOLEX_LLM_BASE_URL") {
        settings.llm.base_url = v;
    }
    if let Some(v) = read_env_string("CHRONOLEX_LLM_MODEL") {
        settings.llm.model = v;
    }
    if let Some(v) = read_env_string("CHRONOLEX_LLM_API_KEY") {
        settings.llm.api_key = Some(v);
    }
    if let Some(v) = read_env_u64("CHRONOLEX_LLM_TIMEOUT_MS", 1000, 300_000) {
        settings.llm.timeout_ms = v;
    }

    // ── Mailbox ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("CHRONOLEX_IMAP_HOST") {
        settings.mailbox.host = Some(v);
    }
    if let Some(v) = read_env_u16("CHRONOLEX_IMAP_PORT", 1, 65535) {
        settings.mailbox.port = v;
    }
    if let Some(v) = read_env_string("CHRONOLEX_IMAP_USERNAME") {
        settings.mailbox.username = Some(v);
    }
    if let Some(v) = read_env_string("CHRONOLEX_IMAP_PASSWORD") {
        settings.mailbox.password = Some(v);
    }
    if let Some(v) = read_env_string("CHRONOLEX_IMAP_FOLDER") {
        settings.mailbox.folder = v;
    }

    // ── Ledger ──────────────────────────────────────────────────────
    if let Some(v) = read_env_string("CHRONOLEX_LEDGER_BASE_URL") {
        settings.ledger.base_url = Some(v);
    }
    if let Some(v) = read_env_string("CHRONOLEX_LEDGER_TOKEN") {
        settings.ledger.api_token = Some(v);
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as an integer within `[min, max]`.
pub fn parse_i64_in_range(val: &str, min: i64, max: i64) -> Option<i64> {
    val.trim()
        .parse::<i64>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

/// Parse a string as a float within `[min, max]`.
pub fn parse_f64_in_range(val: &str, min: f64, max: f64) -> Option<f64> {
    val.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= min && *v <= max)
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn read_env_i64(name: &str, min: i64, max: i64) -> Option<i64> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_i64_in_range(&v, min, max))
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    read_env_i64(name, i64::try_from(min).ok()?, i64::try_from(max).ok()?)
        .and_then(|v| u64::try_from(v).ok())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    read_env_i64(name, i64::from(min), i64::from(max)).and_then(|v| u16::try_from(v).ok())
}

fn read_env_f64(name: &str, min: f64, max: f64) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_f64_in_range(&v, min, max))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
