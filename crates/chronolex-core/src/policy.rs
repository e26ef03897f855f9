//! Billing policy and engine flags.
//!
//! Pure configuration values: constructed by the caller (or loaded by
//! `chronolex-settings`), passed immutably into the engine, no identity
//! or lifecycle beyond the call.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Billing policy
// ─────────────────────────────────────────────────────────────────────────────

/// How the recommended value is derived from normative and actual time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BillingMode {
    /// Recommend the normative (value-billing) minutes.
    Value,
    /// Recommend observed minutes, falling back to normative.
    Actual,
    /// Blend normative and actual by [`BillingPolicy::blend_ratio`].
    #[default]
    Blended,
}

/// Policy parameters for converting classified groups into entries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BillingPolicy {
    /// Value / actual / blended.
    pub mode: BillingMode,
    /// Weight of the normative side in blended mode, 0.0–1.0.
    pub blend_ratio: f64,
    /// Rounding increment in minutes.
    pub min_increment_minutes: u32,
    /// Ceiling-round to the increment when true, nearest otherwise.
    pub round_up: bool,
    /// Cap the recommendation at `actual × cap_multiplier` when actual
    /// minutes were observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_multiplier: Option<f64>,
    /// Smallest entry the policy will emit, in minutes.
    pub min_entry_minutes: u32,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            mode: BillingMode::Blended,
            blend_ratio: 0.5,
            min_increment_minutes: 6,
            round_up: true,
            cap_multiplier: None,
            min_entry_minutes: 6,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine flags
// ─────────────────────────────────────────────────────────────────────────────

/// How aggressively normative baselines are scaled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NormativeStrategy {
    /// Scale baselines down (×0.8).
    Conservative,
    /// Catalog baselines as-is (×1.0).
    #[default]
    Standard,
    /// Scale baselines up (×1.25).
    Aggressive,
}

impl NormativeStrategy {
    /// Scaling factor applied to catalog base minutes.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::Conservative => 0.8,
            Self::Standard => 1.0,
            Self::Aggressive => 1.25,
        }
    }
}

/// Per-run feature toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineFlags {
    /// Enable the AI-assisted classification tier.
    #[serde(alias = "useLLM")]
    pub use_llm: bool,
    /// Run the duplicate detector over the proposals.
    pub enable_dupe_check: bool,
    /// Normative baseline scaling.
    pub normative_strategy: NormativeStrategy,
}

impl Default for EngineFlags {
    fn default() -> Self {
        Self {
            use_llm: false,
            enable_dupe_check: true,
            normative_strategy: NormativeStrategy::Standard,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
