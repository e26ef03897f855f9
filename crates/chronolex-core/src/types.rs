//! Core event types: time windows, matters, evidence, and source events.
//!
//! - [`TimeWindow`]: Half-open UTC analysis window
//! - [`MatterRef`]: Optional matter attribution for an event
//! - [`Evidence`]: Why an event (and later an entry) exists
//! - [`SourceEvent`]: One canonical activity signal from a connector

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::EngineError;

// ─────────────────────────────────────────────────────────────────────────────
// Time window
// ─────────────────────────────────────────────────────────────────────────────

/// Half-open UTC analysis window `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    /// Inclusive start of the window.
    pub start: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a validated window. `end` must be strictly after `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, EngineError> {
        if end <= start {
            return Err(EngineError::Validation {
                message: format!("time window end ({end}) must be after start ({start})"),
            });
        }
        Ok(Self { start, end })
    }

    /// Whether a timestamp falls inside the window (half-open).
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Calendar days (UTC) touched by the window, in order.
    #[must_use]
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut day = self.start.date_naive();
        // The end bound is exclusive, so an end at exactly midnight does
        // not add a day.
        let last = (self.end - Duration::nanoseconds(1)).date_naive();
        while day <= last {
            days.push(day);
            day = day.succ_opt().unwrap_or(day);
            if days.len() > 10_000 {
                break;
            }
        }
        days
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Matter attribution
// ─────────────────────────────────────────────────────────────────────────────

/// Reference to the matter (client engagement) an event belongs to.
///
/// All fields optional; a fully-empty ref denotes internal, unassigned
/// work.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatterRef {
    /// Practice-management system matter ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matter_id: Option<String>,
    /// Client display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// Matter display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matter_name: Option<String>,
}

/// Group key used when no matter attribution exists.
pub const INTERNAL_MATTER_KEY: &str = "Internal";

impl MatterRef {
    /// Stable grouping key: matter ID, else `client::matter`, else
    /// [`INTERNAL_MATTER_KEY`].
    #[must_use]
    pub fn group_key(&self) -> String {
        if let Some(id) = &self.matter_id {
            return id.clone();
        }
        match (&self.client_name, &self.matter_name) {
            (Some(client), Some(matter)) => format!("{client}::{matter}"),
            (Some(client), None) => client.clone(),
            _ => INTERNAL_MATTER_KEY.to_string(),
        }
    }
}

/// Grouping key for an optional matter reference.
#[must_use]
pub fn matter_group_key(matter: Option<&MatterRef>) -> String {
    matter.map_or_else(|| INTERNAL_MATTER_KEY.to_string(), MatterRef::group_key)
}

// ─────────────────────────────────────────────────────────────────────────────
// Evidence
// ─────────────────────────────────────────────────────────────────────────────

/// Strength classification of an evidence item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvidenceType {
    /// Came straight from an authoritative record (ledger activity,
    /// mail envelope).
    Direct,
    /// Inferred from a secondary signal (file modification time).
    Circumstantial,
}

/// A record justifying why an event or proposed entry exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// Direct or circumstantial.
    pub evidence_type: EvidenceType,
    /// Which connector produced it.
    pub source_kind: SourceKind,
    /// Human-readable description of the record.
    pub description: String,
    /// When the underlying record occurred.
    pub timestamp: DateTime<Utc>,
    /// Pointer back to the record (message ID, path, activity ID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    /// Source-specific context.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Source events
// ─────────────────────────────────────────────────────────────────────────────

/// The closed set of activity sources the engine understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// Mail envelopes from an IMAP mailbox.
    Mailbox,
    /// Local file modification activity.
    LocalActivity,
    /// Imported legal-research logs.
    ResearchLog,
    /// Recorded activities in the practice-management ledger.
    Ledger,
}

impl SourceKind {
    /// Stable lowercase identifier, used in event IDs and stats keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mailbox => "mailbox",
            Self::LocalActivity => "local_activity",
            Self::ResearchLog => "research_log",
            Self::Ledger => "ledger",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One canonical activity signal fetched by a connector.
///
/// Immutable once produced; the classifier may add an inferred
/// `taskCode` metadata key but never rewrites timestamps or evidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEvent {
    /// Unique per run (scoped by source kind).
    pub id: String,
    /// Producing source.
    pub kind: SourceKind,
    /// When the activity started (or was observed).
    pub timestamp: DateTime<Utc>,
    /// When the activity ended, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<DateTime<Utc>>,
    /// Recorded duration in minutes, if the source exports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    /// Matter attribution, when inferable at the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matter: Option<MatterRef>,
    /// Short subject line.
    pub subject: String,
    /// Longer description (may be empty).
    #[serde(default)]
    pub description: String,
    /// Evidence backing this event.
    pub evidence: Vec<Evidence>,
    /// Source-specific context; the classifier adds `taskCode` here.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, Value>,
}

impl SourceEvent {
    /// Combined searchable text for classification.
    #[must_use]
    pub fn classification_text(&self) -> String {
        format!("{} {}", self.subject, self.description)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        let err = TimeWindow::new(ts("2026-03-02T00:00:00Z"), ts("2026-03-01T00:00:00Z"));
        assert_matches!(err, Err(EngineError::Validation { .. }));
    }

    #[test]
    fn window_rejects_zero_length() {
        let t = ts("2026-03-01T00:00:00Z");
        assert_matches!(TimeWindow::new(t, t), Err(EngineError::Validation { .. }));
    }

    #[test]
    fn window_contains_is_half_open() {
        let w = TimeWindow::new(ts("2026-03-01T00:00:00Z"), ts("2026-03-02T00:00:00Z")).unwrap();
        assert!(w.contains(ts("2026-03-01T00:00:00Z")));
        assert!(w.contains(ts("2026-03-01T23:59:59Z")));
        assert!(!w.contains(ts("2026-03-02T00:00:00Z")));
    }

    #[test]
    fn window_days_excludes_midnight_end() {
        let w = TimeWindow::new(ts("2026-03-01T00:00:00Z"), ts("2026-03-04T00:00:00Z")).unwrap();
        let days = w.days();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], ts("2026-03-01T00:00:00Z").date_naive());
        assert_eq!(days[2], ts("2026-03-03T00:00:00Z").date_naive());
    }

    #[test]
    fn window_days_includes_partial_last_day() {
        let w = TimeWindow::new(ts("2026-03-01T00:00:00Z"), ts("2026-03-03T12:00:00Z")).unwrap();
        assert_eq!(w.days().len(), 3);
    }

    #[test]
    fn matter_group_key_prefers_id() {
        let m = MatterRef {
            matter_id: Some("M-42".into()),
            client_name: Some("Acme".into()),
            matter_name: Some("Merger".into()),
        };
        assert_eq!(m.group_key(), "M-42");
    }

    #[test]
    fn matter_group_key_falls_back_to_names() {
        let m = MatterRef {
            matter_id: None,
            client_name: Some("Acme".into()),
            matter_name: Some("Merger".into()),
        };
        assert_eq!(m.group_key(), "Acme::Merger");
    }

    #[test]
    fn matter_group_key_internal_when_empty() {
        assert_eq!(MatterRef::default().group_key(), INTERNAL_MATTER_KEY);
        assert_eq!(matter_group_key(None), INTERNAL_MATTER_KEY);
    }

    #[test]
    fn source_kind_display() {
        assert_eq!(SourceKind::LocalActivity.to_string(), "local_activity");
        assert_eq!(SourceKind::Mailbox.to_string(), "mailbox");
    }

    #[test]
    fn source_event_serde_roundtrip() {
        let event = SourceEvent {
            id: "mailbox-1".into(),
            kind: SourceKind::Mailbox,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            end_timestamp: None,
            duration_minutes: Some(6.0),
            matter: None,
            subject: "RE: Notice of Hearing".into(),
            description: String::new(),
            evidence: vec![Evidence {
                evidence_type: EvidenceType::Direct,
                source_kind: SourceKind::Mailbox,
                description: "Email envelope".into(),
                timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
                locator: Some("uid:17".into()),
                metadata: serde_json::Map::new(),
            }],
            metadata: serde_json::Map::new(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: SourceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn source_event_wire_names_are_camel_case() {
        let event = SourceEvent {
            id: "ledger-1".into(),
            kind: SourceKind::Ledger,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            end_timestamp: Some(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()),
            duration_minutes: Some(60.0),
            matter: None,
            subject: "Recorded time".into(),
            description: String::new(),
            evidence: Vec::new(),
            metadata: serde_json::Map::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("endTimestamp").is_some());
        assert!(json.get("durationMinutes").is_some());
        assert_eq!(json["kind"], "ledger");
    }
}
