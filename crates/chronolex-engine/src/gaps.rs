//! Billing-gap identification.
//!
//! Compares recorded ledger time per calendar day against a daily
//! threshold and reports the days that fall short. Operates on the
//! ledger connector's events only — proposed entries do not count as
//! recorded time.

use std::collections::HashMap;

use chrono::NaiveDate;
use chronolex_core::types::{SourceEvent, TimeWindow};
use serde::{Deserialize, Serialize};

/// A day whose recorded time falls under the threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingGap {
    /// The short day.
    pub date: NaiveDate,
    /// Minutes actually recorded on the ledger that day.
    pub recorded_minutes: f64,
    /// Minutes missing to reach the threshold.
    pub deficit_minutes: f64,
}

fn recorded_minutes(event: &SourceEvent) -> f64 {
    if let Some(minutes) = event.duration_minutes {
        return minutes;
    }
    event
        .end_timestamp
        .map_or(0.0, |end| (end - event.timestamp).num_seconds() as f64 / 60.0)
}

/// Identify under-recorded days in the window.
///
/// Every calendar day the window touches is checked, including days
/// with zero recorded events. A day exactly at the threshold is not a
/// gap. Output is date-ordered.
#[must_use]
pub fn identify_gaps(
    window: &TimeWindow,
    recorded: &[SourceEvent],
    threshold_minutes: f64,
) -> Vec<BillingGap> {
    let mut per_day: HashMap<NaiveDate, f64> = HashMap::new();
    for event in recorded {
        *per_day.entry(event.timestamp.date_naive()).or_default() += recorded_minutes(event);
    }

    window
        .days()
        .into_iter()
        .filter_map(|date| {
            let total = per_day.get(&date).copied().unwrap_or(0.0);
            (total < threshold_minutes).then(|| BillingGap {
                date,
                recorded_minutes: total,
                deficit_minutes: threshold_minutes - total,
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
