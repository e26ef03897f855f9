//! Mailbox connector — IMAP mail envelopes as activity events.
//!
//! Opens a TLS IMAP session and searches the configured folder by date
//! range. IMAP `SEARCH SINCE/BEFORE` resolves dates at day granularity
//! and `BEFORE` excludes the named day, so the upper bound is widened
//! by one full day and results outside the exact window are discarded
//! after fetch; without the widening, messages on the window's final
//! day would be silently lost.
//!
//! Message read/compose time is not observable over IMAP, so every
//! message gets a fixed minimal duration quantum (default 6 minutes).

use chrono::{Duration, NaiveDate, Utc};
use tracing::debug;

use chronolex_core::types::{Evidence, EvidenceType, SourceEvent, SourceKind, TimeWindow};

use crate::errors::ConnectorError;
use crate::traits::{ConnectorMetadata, SourceConnector};

/// Configuration for the mailbox connector.
#[derive(Clone, Debug)]
pub struct MailboxConfig {
    /// IMAP host.
    pub host: Option<String>,
    /// IMAP TLS port.
    pub port: u16,
    /// Account username.
    pub username: Option<String>,
    /// Account password.
    pub password: Option<String>,
    /// Folder to search.
    pub folder: String,
    /// Duration quantum assigned to each message, in minutes.
    pub message_duration_minutes: f64,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 993,
            username: None,
            password: None,
            folder: "INBOX".to_string(),
            message_duration_minutes: 6.0,
        }
    }
}

/// IMAP mailbox connector.
pub struct MailboxConnector {
    config: MailboxConfig,
}

impl MailboxConnector {
    /// Create a connector from its configuration.
    #[must_use]
    pub fn new(config: MailboxConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl SourceConnector for MailboxConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            name: "mailbox",
            kind: SourceKind::Mailbox,
            requires_auth: true,
        }
    }

    fn is_configured(&self) -> bool {
        self.config.host.is_some()
            && self.config.username.is_some()
            && self.config.password.is_some()
    }

    async fn fetch_events(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<SourceEvent>, ConnectorError> {
        if !self.is_configured() {
            return Err(ConnectorError::NotConfigured {
                name: "mailbox".into(),
            });
        }
        let config = self.config.clone();
        let window = *window;
        // The imap crate is blocking; keep the protocol session off the
        // async runtime.
        tokio::task::spawn_blocking(move || fetch_blocking(&config, &window))
            .await
            .map_err(|e| ConnectorError::Protocol {
                message: format!("mailbox task failed: {e}"),
            })?
    }
}

/// Format a date the way IMAP `SEARCH` expects (`01-Mar-2026`).
fn imap_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// Build the day-granular search query for a window.
///
/// `BEFORE` excludes the named day, so the bound is the day after the
/// window's (exclusive) end — one day wider than the exact window.
fn imap_search_query(window: &TimeWindow) -> String {
    let since = window.start.date_naive();
    let before = window.end.date_naive() + Duration::days(1);
    format!("SINCE {} BEFORE {}", imap_date(since), imap_date(before))
}

/// Build the canonical event for one message.
fn message_event(
    uid: u32,
    timestamp: chrono::DateTime<Utc>,
    subject: String,
    folder: &str,
    duration_minutes: f64,
) -> SourceEvent {
    SourceEvent {
        id: format!("mailbox-{uid}"),
        kind: SourceKind::Mailbox,
        timestamp,
        end_timestamp: None,
        duration_minutes: Some(duration_minutes),
        matter: None,
        subject: subject.clone(),
        description: String::new(),
        evidence: vec![Evidence {
            evidence_type: EvidenceType::Direct,
            source_kind: SourceKind::Mailbox,
            description: format!("Email envelope: {subject}"),
            timestamp,
            locator: Some(format!("imap:{folder}:{uid}")),
            metadata: serde_json::Map::new(),
        }],
        metadata: serde_json::Map::new(),
    }
}

fn fetch_blocking(
    config: &MailboxConfig,
    window: &TimeWindow,
) -> Result<Vec<SourceEvent>, ConnectorError> {
    let (Some(host), Some(username), Some(password)) =
        (&config.host, &config.username, &config.password)
    else {
        return Err(ConnectorError::NotConfigured {
            name: "mailbox".into(),
        });
    };

    let tls = native_tls::TlsConnector::builder().build()?;
    let client = imap::connect((host.as_str(), config.port), host.as_str(), &tls)?;
    let mut session = client
        .login(username, password)
        .map_err(|(e, _)| ConnectorError::Auth {
            message: e.to_string(),
        })?;

    let _ = session.select(&config.folder)?;
    let query = imap_search_query(window);
    debug!(%query, folder = %config.folder, "searching mailbox");
    let uids = session.uid_search(&query)?;
    if uids.is_empty() {
        let _ = session.logout();
        return Ok(Vec::new());
    }

    let mut sorted: Vec<u32> = uids.into_iter().collect();
    sorted.sort_unstable();
    let set = sorted
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let fetches = session.uid_fetch(set, "(UID ENVELOPE INTERNALDATE)")?;

    let mut events = Vec::new();
    for fetch in fetches.iter() {
        let Some(uid) = fetch.uid else { continue };
        let Some(internal_date) = fetch.internal_date() else {
            continue;
        };
        let timestamp = internal_date.with_timezone(&Utc);
        // The search bound was widened to a full day; enforce the exact
        // half-open window here.
        if !window.contains(timestamp) {
            continue;
        }
        let subject = fetch
            .envelope()
            .and_then(|e| e.subject.as_ref())
            .map_or_else(
                || "(no subject)".to_string(),
                |s| String::from_utf8_lossy(s).into_owned(),
            );
        events.push(message_event(
            uid,
            timestamp,
            subject,
            &config.folder,
            config.message_duration_minutes,
        ));
    }

    let _ = session.logout();
    debug!(count = events.len(), "mailbox fetch complete");
    Ok(events)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::DateTime;

    fn window(start: &str, end: &str) -> TimeWindow {
        TimeWindow::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    #[test]
    fn imap_date_format() {
        let d = "2026-03-01".parse::<NaiveDate>().unwrap();
        assert_eq!(imap_date(d), "01-Mar-2026");
    }

    #[test]
    fn search_query_widens_before_bound_by_one_day() {
        let w = window("2026-03-01T00:00:00Z", "2026-03-03T09:00:00Z");
        assert_eq!(
            imap_search_query(&w),
            "SINCE 01-Mar-2026 BEFORE 04-Mar-2026"
        );
    }

    #[test]
    fn search_query_widens_even_at_midnight_end() {
        // A midnight end excludes its day from the window, but the IMAP
        // bound still widens; the post-fetch filter discards the extras.
        let w = window("2026-03-01T00:00:00Z", "2026-03-03T00:00:00Z");
        assert_eq!(
            imap_search_query(&w),
            "SINCE 01-Mar-2026 BEFORE 04-Mar-2026"
        );
    }

    #[test]
    fn unconfigured_without_credentials() {
        let connector = MailboxConnector::new(MailboxConfig::default());
        assert!(!connector.is_configured());

        let connector = MailboxConnector::new(MailboxConfig {
            host: Some("imap.example.com".into()),
            username: Some("user".into()),
            password: Some("secret".into()),
            ..MailboxConfig::default()
        });
        assert!(connector.is_configured());
    }

    #[tokio::test]
    async fn fetch_on_unconfigured_reports_not_configured() {
        let connector = MailboxConnector::new(MailboxConfig::default());
        let w = window("2026-03-01T00:00:00Z", "2026-03-02T00:00:00Z");
        let err = connector.fetch_events(&w).await.unwrap_err();
        assert_matches!(err, ConnectorError::NotConfigured { .. });
    }

    #[test]
    fn message_event_shape() {
        let ts: DateTime<Utc> = "2026-03-01T09:15:00Z".parse().unwrap();
        let event = message_event(17, ts, "RE: Notice of Hearing".into(), "INBOX", 6.0);
        assert_eq!(event.id, "mailbox-17");
        assert_eq!(event.kind, SourceKind::Mailbox);
        assert_eq!(event.duration_minutes, Some(6.0));
        assert_eq!(event.evidence.len(), 1);
        assert_eq!(event.evidence[0].evidence_type, EvidenceType::Direct);
        assert_eq!(
            event.evidence[0].locator.as_deref(),
            Some("imap:INBOX:17")
        );
    }
}
