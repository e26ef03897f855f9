//! Pairwise duplicate detection over proposed entries.
//!
//! Every unordered pair is scored on a fixed set of signals; pairs at
//! or above the threshold are flagged with the reasons that fired.
//! Naturally repeatable tasks (email, calls, scheduling, research) on
//! the same date need a higher score before being flagged, since two
//! legitimate instances look alike. Quadratic in the run's entry
//! count, which stays small.

use std::collections::HashSet;

use chronolex_core::entry::{DuplicateMatch, ProposedEntry};

/// Minimum score to flag a pair.
const BASE_THRESHOLD: u32 = 50;

/// Raised threshold for same-date pairs of naturally repeatable tasks.
const REPEATABLE_THRESHOLD: u32 = 80;

/// Lowercase alphanumeric token set for Jaccard similarity.
fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Score one pair of entries. Symmetric in its arguments.
///
/// Returns the cumulative score (clamped to 100) and the signals that
/// contributed.
#[must_use]
pub fn score_pair(a: &ProposedEntry, b: &ProposedEntry) -> (u32, Vec<String>) {
    let mut score = 0u32;
    let mut reasons = Vec::new();

    if a.date == b.date {
        score += 30;
        reasons.push("same date".to_string());
    }
    // Unattributed (internal) entries never count as the same matter.
    if let (Some(ma), Some(mb)) = (&a.matter, &b.matter) {
        if ma.group_key() == mb.group_key() {
            score += 20;
            reasons.push("same matter".to_string());
        }
    }
    if a.task_code == b.task_code {
        score += 25;
        reasons.push("same task code".to_string());
    }

    let similarity = jaccard(&tokens(&a.description), &tokens(&b.description));
    if similarity > 0.8 {
        score += 20;
        reasons.push("descriptions nearly identical".to_string());
    } else if similarity > 0.5 {
        score += 10;
        reasons.push("descriptions similar".to_string());
    }

    let ids_a: HashSet<&str> = a.source_event_ids.iter().map(String::as_str).collect();
    if b.source_event_ids.iter().any(|id| ids_a.contains(id.as_str())) {
        score += 30;
        reasons.push("shared source events".to_string());
    }

    let average = (a.recommended_minutes + b.recommended_minutes) / 2.0;
    if average > 0.0 && (a.recommended_minutes - b.recommended_minutes).abs() <= 0.1 * average {
        score += 10;
        reasons.push("similar duration".to_string());
    }

    (score.min(100), reasons)
}

fn threshold(a: &ProposedEntry, b: &ProposedEntry) -> u32 {
    if a.date == b.date
        && a.task_code.is_naturally_repeatable()
        && b.task_code.is_naturally_repeatable()
    {
        REPEATABLE_THRESHOLD
    } else {
        BASE_THRESHOLD
    }
}

/// Flag likely-duplicate pairs among the run's entries.
///
/// Each unordered pair appears at most once, in input order.
#[must_use]
pub fn detect_duplicates(entries: &[ProposedEntry]) -> Vec<DuplicateMatch> {
    let mut matches = Vec::new();
    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            let (score, reasons) = score_pair(a, b);
            if score >= threshold(a, b) {
                matches.push(DuplicateMatch {
                    entry1_id: a.id.clone(),
                    entry2_id: b.id.clone(),
                    similarity: score,
                    reasons,
                });
            }
        }
    }
    matches
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
