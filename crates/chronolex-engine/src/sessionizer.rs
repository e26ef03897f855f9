//! Gap-threshold sessionization.
//!
//! Clusters the aggregator's time-ordered event stream into work
//! sessions: consecutive events on the same matter whose gaps stay
//! under the threshold land in one session. A pure function of its
//! inputs — identical event streams produce identical sessions.

use chrono::{DateTime, Duration, Utc};
use chronolex_core::types::{matter_group_key, MatterRef, SourceEvent};

/// A contiguous cluster of activity on one matter.
///
/// Invariant: `events` is non-empty and time-ordered.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// Stable grouping key for the matter (or `Internal`).
    pub matter_key: String,
    /// Matter attribution shared by the session's events, if any.
    pub matter: Option<MatterRef>,
    /// The events in the session, time-ordered.
    pub events: Vec<SourceEvent>,
}

impl Session {
    /// When the session starts.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.events[0].timestamp
    }

    /// When the session ends: the latest timestamp or end timestamp
    /// across its events.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.events
            .iter()
            .map(|e| e.end_timestamp.unwrap_or(e.timestamp))
            .max()
            .unwrap_or_else(|| self.start())
    }

    /// Combined subject/description text for classification.
    #[must_use]
    pub fn classification_text(&self) -> String {
        self.events
            .iter()
            .map(SourceEvent::classification_text)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// The effective end of an event, for gap measurement.
fn effective_end(event: &SourceEvent) -> DateTime<Utc> {
    event.end_timestamp.unwrap_or(event.timestamp)
}

/// Cluster a time-ordered event stream into sessions.
///
/// Events on different matters never share a session. Within a matter,
/// a new session starts when the gap from the previous event's end to
/// the next event's start exceeds `gap` (a gap of exactly `gap` stays
/// in the same session). Output is ordered by session start, then
/// matter key.
#[must_use]
pub fn sessionize(events: &[SourceEvent], gap: Duration) -> Vec<Session> {
    // BTreeMap keeps per-matter iteration deterministic.
    let mut by_matter: std::collections::BTreeMap<String, Vec<&SourceEvent>> =
        std::collections::BTreeMap::new();
    for event in events {
        by_matter
            .entry(matter_group_key(event.matter.as_ref()))
            .or_default()
            .push(event);
    }

    let mut sessions = Vec::new();
    for (matter_key, matter_events) in by_matter {
        let mut current: Vec<SourceEvent> = Vec::new();
        for event in matter_events {
            if let Some(previous) = current.last() {
                if event.timestamp - effective_end(previous) > gap {
                    sessions.push(finish(matter_key.clone(), std::mem::take(&mut current)));
                }
            }
            current.push(event.clone());
        }
        if !current.is_empty() {
            sessions.push(finish(matter_key.clone(), current));
        }
    }

    sessions.sort_by(|a, b| {
        a.start()
            .cmp(&b.start())
            .then_with(|| a.matter_key.cmp(&b.matter_key))
    });
    sessions
}

fn finish(matter_key: String, events: Vec<SourceEvent>) -> Session {
    let matter = events.iter().find_map(|e| e.matter.clone());
    Session {
        matter_key,
        matter,
        events,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
