//! Research-log import connector — delimited export files.
//!
//! Legal-research platforms export activity logs with wildly varying
//! column names, so each logical field is matched against several
//! header aliases. Rows missing a parseable start timestamp are skipped
//! (not failed); duration is taken directly from an exported
//! minutes/duration column when present.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

use chronolex_core::types::{
    Evidence, EvidenceType, MatterRef, SourceEvent, SourceKind, TimeWindow,
};

use crate::errors::ConnectorError;
use crate::traits::{ConnectorMetadata, SourceConnector};

/// Header aliases per logical column.
const TIMESTAMP_ALIASES: &[&str] = &[
    "timestamp",
    "start",
    "start_time",
    "started",
    "date",
    "datetime",
    "search_time",
];
const DURATION_ALIASES: &[&str] =
    &["duration", "duration_minutes", "minutes", "mins", "time_spent"];
const DESCRIPTION_ALIASES: &[&str] =
    &["description", "query", "search", "notes", "activity", "terms"];
const MATTER_ALIASES: &[&str] = &["matter_id", "matter", "matter_number", "matter_no"];
const CLIENT_ALIASES: &[&str] = &["client", "client_name"];

/// Configuration for the research-log connector.
#[derive(Clone, Debug, Default)]
pub struct ResearchLogConfig {
    /// Delimited export files to import.
    pub paths: Vec<PathBuf>,
}

/// Research-log import connector.
pub struct ResearchLogConnector {
    config: ResearchLogConfig,
}

impl ResearchLogConnector {
    /// Create a connector from its configuration.
    #[must_use]
    pub fn new(config: ResearchLogConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl SourceConnector for ResearchLogConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            name: "research_log",
            kind: SourceKind::ResearchLog,
            requires_auth: false,
        }
    }

    fn is_configured(&self) -> bool {
        !self.config.paths.is_empty()
    }

    async fn fetch_events(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<SourceEvent>, ConnectorError> {
        if !self.is_configured() {
            return Err(ConnectorError::NotConfigured {
                name: "research_log".into(),
            });
        }
        let config = self.config.clone();
        let window = *window;
        tokio::task::spawn_blocking(move || import_blocking(&config, &window))
            .await
            .map_err(|e| ConnectorError::Parse {
                message: format!("import task failed: {e}"),
            })?
    }
}

/// Resolved column indices for one file.
#[derive(Clone, Copy, Debug, Default)]
struct HeaderMap {
    timestamp: Option<usize>,
    duration: Option<usize>,
    description: Option<usize>,
    matter: Option<usize>,
    client: Option<usize>,
}

/// Normalize a header cell for alias comparison.
fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace([' ', '-'], "_")
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.contains(&normalize_header(h).as_str()))
}

/// Resolve every logical column from the header row.
fn resolve_headers(headers: &csv::StringRecord) -> HeaderMap {
    HeaderMap {
        timestamp: find_column(headers, TIMESTAMP_ALIASES),
        duration: find_column(headers, DURATION_ALIASES),
        description: find_column(headers, DESCRIPTION_ALIASES),
        matter: find_column(headers, MATTER_ALIASES),
        client: find_column(headers, CLIENT_ALIASES),
    }
}

/// Parse an exported timestamp in any of the common formats.
///
/// Naive timestamps are taken as UTC; a bare date becomes midnight UTC.
fn parse_flexible_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn cell<'a>(record: &'a csv::StringRecord, index: Option<usize>) -> Option<&'a str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn import_blocking(
    config: &ResearchLogConfig,
    window: &TimeWindow,
) -> Result<Vec<SourceEvent>, ConnectorError> {
    let mut events = Vec::new();
    for path in &config.paths {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let columns = resolve_headers(reader.headers()?);
        if columns.timestamp.is_none() {
            return Err(ConnectorError::Parse {
                message: format!(
                    "{}: no recognizable timestamp column (tried {TIMESTAMP_ALIASES:?})",
                    path.display()
                ),
            });
        }

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let Some(timestamp) =
                cell(&record, columns.timestamp).and_then(parse_flexible_timestamp)
            else {
                debug!(path = %path.display(), row, "skipping row without parseable timestamp");
                continue;
            };
            if !window.contains(timestamp) {
                continue;
            }

            let duration_minutes = cell(&record, columns.duration)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|m| *m >= 0.0);
            let description = cell(&record, columns.description).unwrap_or("").to_string();
            let matter_id = cell(&record, columns.matter).map(str::to_string);
            let client_name = cell(&record, columns.client).map(str::to_string);
            let matter = (matter_id.is_some() || client_name.is_some()).then(|| MatterRef {
                matter_id,
                client_name,
                matter_name: None,
            });

            let subject = if description.is_empty() {
                "Legal research".to_string()
            } else {
                description.clone()
            };
            events.push(SourceEvent {
                id: format!("research_log-{}", events.len()),
                kind: SourceKind::ResearchLog,
                timestamp,
                end_timestamp: None,
                duration_minutes,
                matter,
                subject,
                description,
                evidence: vec![Evidence {
                    evidence_type: EvidenceType::Direct,
                    source_kind: SourceKind::ResearchLog,
                    description: format!("Research log row {row} in {}", path.display()),
                    timestamp,
                    locator: Some(format!("{}:{row}", path.display())),
                    metadata: serde_json::Map::new(),
                }],
                metadata: serde_json::Map::new(),
            });
        }
    }
    debug!(count = events.len(), "research log import complete");
    Ok(events)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
