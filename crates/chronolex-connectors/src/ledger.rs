//! Ledger connector — authenticated practice-management REST client.
//!
//! Fetches already-recorded activities with paginated GETs (the ledger
//! exports durations as fractional hours, converted to minutes here),
//! and serves as the write-back target: approved entries are posted one
//! at a time, with per-entry outcomes so one failure never aborts the
//! batch. A dry-run mode performs the mapping and validation without
//! calling the API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use chronolex_core::types::{
    Evidence, EvidenceType, MatterRef, SourceEvent, SourceKind, TimeWindow,
};

use crate::errors::ConnectorError;
use crate::traits::{ConnectorMetadata, SourceConnector};

/// Activities fetched per page.
const PAGE_SIZE: usize = 100;

/// Configuration for the ledger connector.
#[derive(Clone, Debug, Default)]
pub struct LedgerConfig {
    /// Base URL of the ledger REST API.
    pub base_url: Option<String>,
    /// Bearer token.
    pub api_token: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// One recorded activity as the ledger API returns it.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerActivity {
    id: String,
    occurred_at: DateTime<Utc>,
    /// The ledger records durations as fractional hours.
    hours: f64,
    #[serde(default)]
    note: String,
    #[serde(default)]
    matter_id: Option<String>,
    #[serde(default)]
    client_name: Option<String>,
    #[serde(default)]
    matter_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct ActivitiesPage {
    activities: Vec<LedgerActivity>,
}

/// An approved entry to write back to the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedEntry {
    /// Target matter ID.
    pub matter_id: String,
    /// Day the work is recorded on.
    pub date: NaiveDate,
    /// Approved minutes.
    pub minutes: f64,
    /// Ledger narrative.
    pub description: String,
}

/// Per-entry result of a write-back attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    /// Whether the entry was accepted.
    pub ok: bool,
    /// Ledger-assigned activity ID on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Failure description on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewActivity<'a> {
    matter_id: &'a str,
    date: NaiveDate,
    hours: f64,
    note: &'a str,
}

#[derive(Deserialize)]
struct CreatedActivity {
    id: String,
}

/// Practice-management ledger REST connector.
pub struct LedgerConnector {
    config: LedgerConfig,
    client: reqwest::Client,
}

impl LedgerConnector {
    /// Create a connector from its configuration.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        let timeout = std::time::Duration::from_millis(config.timeout_ms.unwrap_or(30_000));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("chronolex/0.1")
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn credentials(&self) -> Result<(&str, &str), ConnectorError> {
        match (&self.config.base_url, &self.config.api_token) {
            (Some(base), Some(token)) => Ok((base.trim_end_matches('/'), token)),
            _ => Err(ConnectorError::NotConfigured {
                name: "ledger".into(),
            }),
        }
    }

    async fn fetch_page(
        &self,
        base: &str,
        token: &str,
        window: &TimeWindow,
        page: usize,
    ) -> Result<Vec<LedgerActivity>, ConnectorError> {
        let response = self
            .client
            .get(format!("{base}/activities"))
            .bearer_auth(token)
            .query(&[
                ("start", window.start.to_rfc3339()),
                ("end", window.end.to_rfc3339()),
                ("page", page.to_string()),
                ("perPage", PAGE_SIZE.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ConnectorError::Auth {
                message: format!("ledger rejected credentials ({status})"),
            });
        }
        if !status.is_success() {
            return Err(ConnectorError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        let page: ActivitiesPage = response.json().await?;
        Ok(page.activities)
    }

    /// Write approved entries back to the ledger, one POST per entry.
    ///
    /// A failure on one entry records its outcome and the batch
    /// continues. With `dry_run`, the mapping and validation run but no
    /// request is sent.
    pub async fn record_entries(
        &self,
        entries: &[ApprovedEntry],
        dry_run: bool,
    ) -> Result<Vec<PushOutcome>, ConnectorError> {
        let (base, token) = self.credentials()?;
        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Err(message) = validate_entry(entry) {
                outcomes.push(PushOutcome {
                    ok: false,
                    id: None,
                    error: Some(message),
                });
                continue;
            }
            let body = NewActivity {
                matter_id: &entry.matter_id,
                date: entry.date,
                hours: minutes_to_hours(entry.minutes),
                note: &entry.description,
            };
            if dry_run {
                outcomes.push(PushOutcome {
                    ok: true,
                    id: Some("dry-run".into()),
                    error: None,
                });
                continue;
            }
            outcomes.push(self.post_activity(base, token, &body).await);
        }
        Ok(outcomes)
    }

    async fn post_activity(&self, base: &str, token: &str, body: &NewActivity<'_>) -> PushOutcome {
        let result = self
            .client
            .post(format!("{base}/activities"))
            .bearer_auth(token)
            .json(body)
            .send()
            .await;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "ledger push failed");
                return PushOutcome {
                    ok: false,
                    id: None,
                    error: Some(e.to_string()),
                };
            }
        };
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(%status, "ledger rejected entry");
            return PushOutcome {
                ok: false,
                id: None,
                error: Some(format!("{status}: {message}")),
            };
        }
        match response.json::<CreatedActivity>().await {
            Ok(created) => PushOutcome {
                ok: true,
                id: Some(created.id),
                error: None,
            },
            Err(e) => PushOutcome {
                ok: false,
                id: None,
                error: Some(format!("unreadable create response: {e}")),
            },
        }
    }
}

/// Convert minutes to the ledger's fractional hours, 2-decimal rounded.
fn minutes_to_hours(minutes: f64) -> f64 {
    (minutes / 60.0 * 100.0).round() / 100.0
}

fn validate_entry(entry: &ApprovedEntry) -> Result<(), String> {
    if entry.matter_id.trim().is_empty() {
        return Err("matterId must not be empty".into());
    }
    if !entry.minutes.is_finite() || entry.minutes <= 0.0 {
        return Err(format!("minutes must be positive, got {}", entry.minutes));
    }
    Ok(())
}

fn activity_event(activity: LedgerActivity) -> SourceEvent {
    let matter = (activity.matter_id.is_some()
        || activity.client_name.is_some()
        || activity.matter_name.is_some())
    .then(|| MatterRef {
        matter_id: activity.matter_id.clone(),
        client_name: activity.client_name.clone(),
        matter_name: activity.matter_name.clone(),
    });
    let subject = if activity.note.is_empty() {
        "Recorded ledger activity".to_string()
    } else {
        activity.note.clone()
    };
    SourceEvent {
        id: format!("ledger-{}", activity.id),
        kind: SourceKind::Ledger,
        timestamp: activity.occurred_at,
        end_timestamp: None,
        duration_minutes: Some(activity.hours * 60.0),
        matter,
        subject,
        description: activity.note.clone(),
        evidence: vec![Evidence {
            evidence_type: EvidenceType::Direct,
            source_kind: SourceKind::Ledger,
            description: "Recorded ledger activity".to_string(),
            timestamp: activity.occurred_at,
            locator: Some(format!("activity:{}", activity.id)),
            metadata: serde_json::Map::new(),
        }],
        metadata: serde_json::Map::new(),
    }
}

#[async_trait::async_trait]
impl SourceConnector for LedgerConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            name: "ledger",
            kind: SourceKind::Ledger,
            requires_auth: true,
        }
    }

    fn is_configured(&self) -> bool {
        self.config.base_url.is_some() && self.config.api_token.is_some()
    }

    async fn fetch_events(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<SourceEvent>, ConnectorError> {
        let (base, token) = self.credentials()?;
        let mut events = Vec::new();
        let mut page = 1;
        loop {
            let activities = self.fetch_page(base, token, window, page).await?;
            let page_len = activities.len();
            events.extend(
                activities
                    .into_iter()
                    .filter(|a| window.contains(a.occurred_at))
                    .map(activity_event),
            );
            if page_len < PAGE_SIZE {
                break;
            }
            page += 1;
        }
        debug!(count = events.len(), pages = page, "ledger fetch complete");
        Ok(events)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn window(start: &str, end: &str) -> TimeWindow {
        TimeWindow::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    fn connector(base_url: &str) -> LedgerConnector {
        LedgerConnector::new(LedgerConfig {
            base_url: Some(base_url.to_string()),
            api_token: Some("token-1".into()),
            timeout_ms: Some(5_000),
        })
    }

    #[test]
    fn minutes_to_hours_rounds_to_two_decimals() {
        assert!((minutes_to_hours(90.0) - 1.5).abs() < 1e-9);
        assert!((minutes_to_hours(50.0) - 0.83).abs() < 1e-9);
        assert!((minutes_to_hours(6.0) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_bad_entries() {
        let entry = ApprovedEntry {
            matter_id: String::new(),
            date: "2026-03-01".parse().unwrap(),
            minutes: 30.0,
            description: "ok".into(),
        };
        assert!(validate_entry(&entry).is_err());

        let entry = ApprovedEntry {
            matter_id: "M-1".into(),
            date: "2026-03-01".parse().unwrap(),
            minutes: 0.0,
            description: "ok".into(),
        };
        assert!(validate_entry(&entry).is_err());
    }

    #[tokio::test]
    async fn fetch_maps_hours_to_minutes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/activities"))
            .and(bearer_token("token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "activities": [{
                    "id": "a-1",
                    "occurredAt": "2026-03-01T10:00:00Z",
                    "hours": 1.5,
                    "note": "Reviewed discovery responses",
                    "matterId": "M-42",
                    "clientName": "Acme",
                    "matterName": "Merger"
                }]
            })))
            .mount(&server)
            .await;

        let connector = connector(&server.uri());
        let w = window("2026-03-01T00:00:00Z", "2026-03-02T00:00:00Z");
        let events = connector.fetch_events(&w).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "ledger-a-1");
        assert_eq!(events[0].duration_minutes, Some(90.0));
        assert_eq!(
            events[0].matter.as_ref().unwrap().matter_id.as_deref(),
            Some("M-42")
        );
        assert_eq!(events[0].evidence[0].evidence_type, EvidenceType::Direct);
    }

    #[tokio::test]
    async fn fetch_paginates_until_short_page() {
        let server = MockServer::start().await;
        let full_page: Vec<_> = (0..PAGE_SIZE)
            .map(|i| {
                json!({
                    "id": format!("a-{i}"),
                    "occurredAt": "2026-03-01T10:00:00Z",
                    "hours": 0.1,
                    "note": "entry"
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/activities"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "activities": full_page })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/activities"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "activities": [] })))
            .mount(&server)
            .await;

        let connector = connector(&server.uri());
        let w = window("2026-03-01T00:00:00Z", "2026-03-02T00:00:00Z");
        let events = connector.fetch_events(&w).await.unwrap();
        assert_eq!(events.len(), PAGE_SIZE);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/activities"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let connector = connector(&server.uri());
        let w = window("2026-03-01T00:00:00Z", "2026-03-02T00:00:00Z");
        let err = connector.fetch_events(&w).await.unwrap_err();
        assert_matches!(err, ConnectorError::Auth { .. });
    }

    #[tokio::test]
    async fn push_continues_past_per_entry_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/activities"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "new-1" })))
            .mount(&server)
            .await;

        let connector = connector(&server.uri());
        let entries = vec![
            ApprovedEntry {
                matter_id: "M-1".into(),
                date: "2026-03-01".parse().unwrap(),
                minutes: 90.0,
                description: "Draft motion".into(),
            },
            ApprovedEntry {
                matter_id: String::new(), // invalid: fails validation
                date: "2026-03-01".parse().unwrap(),
                minutes: 30.0,
                description: "Bad entry".into(),
            },
        ];
        let outcomes = connector.record_entries(&entries, false).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].ok);
        assert_eq!(outcomes[0].id.as_deref(), Some("new-1"));
        assert!(!outcomes[1].ok);
        assert!(outcomes[1].error.as_ref().unwrap().contains("matterId"));
    }

    #[tokio::test]
    async fn dry_run_never_calls_the_api() {
        // No mock server mounted: a real request would error.
        let connector = connector("http://127.0.0.1:9");
        let entries = vec![ApprovedEntry {
            matter_id: "M-1".into(),
            date: "2026-03-01".parse().unwrap(),
            minutes: 45.0,
            description: "Review file".into(),
        }];
        let outcomes = connector.record_entries(&entries, true).await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].ok);
        assert_eq!(outcomes[0].id.as_deref(), Some("dry-run"));
    }

    #[tokio::test]
    async fn unconfigured_ledger_reports_not_configured() {
        let connector = LedgerConnector::new(LedgerConfig::default());
        assert!(!connector.is_configured());
        let w = window("2026-03-01T00:00:00Z", "2026-03-02T00:00:00Z");
        assert_matches!(
            connector.fetch_events(&w).await.unwrap_err(),
            ConnectorError::NotConfigured { .. }
        );
        assert_matches!(
            connector.record_entries(&[], false).await.unwrap_err(),
            ConnectorError::NotConfigured { .. }
        );
    }
}
