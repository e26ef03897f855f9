//! Valuation policy: classified sessions → proposed entries.
//!
//! Groups classified events by (matter, date, task code), computes
//! normative and actual minutes per group, blends them per the billing
//! mode, applies the cap and rounding, and emits one [`ProposedEntry`]
//! per group. Pure and deterministic apart from the freshly minted
//! entry IDs.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use chronolex_core::catalog::NormativeCatalog;
use chronolex_core::entry::{Basis, Complexity, ProposedEntry, TaskCode};
use chronolex_core::policy::{BillingMode, BillingPolicy, EngineFlags};
use chronolex_core::types::{Evidence, EvidenceType, MatterRef, SourceEvent};
use serde_json::Value;
use uuid::Uuid;

use crate::classifier::ClassifiedSession;

/// Baseline reconstruction confidence; direct evidence raises it.
const BASE_CONFIDENCE: f64 = 0.8;

/// Round minutes to the billing increment.
///
/// Ceiling-rounds when `round_up` is set, nearest otherwise. An
/// increment of zero disables rounding.
#[must_use]
pub fn round_to_increment(minutes: f64, increment: u32, round_up: bool) -> f64 {
    if increment == 0 || minutes <= 0.0 {
        return minutes.max(0.0);
    }
    let inc = f64::from(increment);
    let steps = if round_up {
        (minutes / inc).ceil()
    } else {
        (minutes / inc).round()
    };
    steps * inc
}

/// Case-folded, whitespace-collapsed description for instance counting.
fn normalize_description(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Observed minutes for one event: recorded duration, else the span
/// between its timestamps.
fn event_actual_minutes(event: &SourceEvent) -> Option<f64> {
    if let Some(minutes) = event.duration_minutes {
        return Some(minutes);
    }
    event
        .end_timestamp
        .map(|end| (end - event.timestamp).num_seconds() as f64 / 60.0)
}

/// Text identifying a distinct piece of work: the description, falling
/// back to the subject for events (mail, file activity) that carry
/// only one.
fn work_text(event: &SourceEvent) -> &str {
    let description = event.description.trim();
    if description.is_empty() {
        event.subject.trim()
    } else {
        description
    }
}

fn event_complexity(event: &SourceEvent) -> Option<Complexity> {
    event
        .metadata
        .get("complexity")
        .and_then(Value::as_str)
        .and_then(Complexity::parse)
}

struct Group<'a> {
    matter: Option<&'a MatterRef>,
    code: TaskCode,
    events: Vec<&'a SourceEvent>,
}

/// Build proposed entries from the run's classified sessions.
///
/// Output order is deterministic: matter key, then date, then task
/// code.
#[must_use]
pub fn build_entries(
    sessions: &[ClassifiedSession],
    catalog: &NormativeCatalog,
    policy: &BillingPolicy,
    flags: &EngineFlags,
) -> Vec<ProposedEntry> {
    let mut groups: BTreeMap<(String, NaiveDate, &'static str), Group<'_>> = BTreeMap::new();
    for classified in sessions {
        for event in &classified.session.events {
            let key = (
                classified.session.matter_key.clone(),
                event.timestamp.date_naive(),
                classified.task_code.as_str(),
            );
            groups
                .entry(key)
                .or_insert_with(|| Group {
                    matter: classified.session.matter.as_ref(),
                    code: classified.task_code,
                    events: Vec::new(),
                })
                .events
                .push(event);
        }
    }

    groups
        .into_iter()
        .map(|((_, date, _), group)| build_entry(date, &group, catalog, policy, flags))
        .collect()
}

fn build_entry(
    date: NaiveDate,
    group: &Group<'_>,
    catalog: &NormativeCatalog,
    policy: &BillingPolicy,
    flags: &EngineFlags,
) -> ProposedEntry {
    let item = catalog.get(group.code);

    // Actual minutes exist only if at least one event observed time.
    let mut actual_sum = 0.0;
    let mut any_actual = false;
    for event in &group.events {
        if let Some(minutes) = event_actual_minutes(event) {
            actual_sum += minutes;
            any_actual = true;
        }
    }
    let actual_minutes = any_actual.then_some(actual_sum);

    // One normative unit per distinct piece of work, never fewer than
    // one for a non-empty group.
    let distinct: HashSet<String> = group
        .events
        .iter()
        .map(|e| normalize_description(work_text(e)))
        .filter(|d| !d.is_empty())
        .collect();
    let instance_count = distinct.len().max(1);

    let complexity = group
        .events
        .iter()
        .filter_map(|e| event_complexity(e))
        .max()
        .unwrap_or_default();

    let normative_minutes = item.base_minutes
        * flags.normative_strategy.factor()
        * complexity.multiplier()
        * instance_count as f64;

    let (mut recommended, basis) = match (policy.mode, actual_minutes) {
        (BillingMode::Value, _) | (_, None) => (normative_minutes, Basis::Normative),
        (BillingMode::Actual, Some(actual)) => (actual, Basis::Actual),
        (BillingMode::Blended, Some(actual)) => {
            let ratio = policy.blend_ratio.clamp(0.0, 1.0);
            (
                ratio * normative_minutes + (1.0 - ratio) * actual,
                Basis::Hybrid,
            )
        }
    };

    if let (Some(cap), Some(actual)) = (policy.cap_multiplier, actual_minutes) {
        recommended = recommended.min(actual * cap);
    }
    recommended = round_to_increment(recommended, policy.min_increment_minutes, policy.round_up);
    recommended = recommended.max(f64::from(policy.min_entry_minutes));

    let evidence: Vec<Evidence> = group
        .events
        .iter()
        .flat_map(|e| e.evidence.iter().cloned())
        .collect();
    let direct = evidence
        .iter()
        .filter(|e| e.evidence_type == EvidenceType::Direct)
        .count();
    let confidence = if evidence.is_empty() {
        BASE_CONFIDENCE
    } else {
        (BASE_CONFIDENCE + 0.2 * (direct as f64 / evidence.len() as f64)).clamp(0.0, 1.0)
    };

    ProposedEntry {
        id: Uuid::new_v4().to_string(),
        matter: group.matter.cloned(),
        date,
        task_code: group.code,
        task_label: item.label.clone(),
        actual_minutes,
        normative_minutes,
        recommended_minutes: recommended,
        basis,
        description: entry_description(&group.events, &item.label),
        activity_category: item.category,
        source_event_ids: group.events.iter().map(|e| e.id.clone()).collect(),
        evidence,
        complexity,
        confidence,
    }
}

/// Narrative for the ledger: distinct descriptions in first-seen
/// order, falling back to subjects, then to the catalog label.
fn entry_description(events: &[&SourceEvent], label: &str) -> String {
    let mut seen = HashSet::new();
    let mut parts: Vec<&str> = Vec::new();
    for event in events {
        let text = work_text(event);
        if !text.is_empty() && seen.insert(normalize_description(text)) {
            parts.push(text);
        }
    }
    if parts.is_empty() {
        label.to_string()
    } else {
        parts.join("; ")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
