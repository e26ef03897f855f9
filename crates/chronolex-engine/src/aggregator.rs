//! Concurrent source aggregation.
//!
//! Fetches from every configured connector in parallel, each under its
//! own deadline, and merges the results into one deterministic stream
//! sorted by `(timestamp, id)`. Source failures are isolated: a
//! connector that errors, times out, or is cancelled simply
//! contributes nothing, and the run proceeds with the rest.

use std::collections::HashMap;
use std::sync::Arc;

use chronolex_connectors::SourceConnector;
use chronolex_core::types::{SourceEvent, TimeWindow};
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Merged fetch results for one run.
#[derive(Clone, Debug, Default)]
pub struct AggregateOutcome {
    /// All events, sorted by `(timestamp, id)`.
    pub events: Vec<SourceEvent>,
    /// Names of the sources that contributed, sorted.
    pub sources_used: Vec<String>,
    /// Event count per contributing source.
    pub events_by_source: HashMap<String, usize>,
}

/// Fetch from all configured connectors concurrently and merge.
///
/// Unconfigured connectors are skipped up front. The merged order
/// depends only on the events themselves, never on which source
/// finished first.
pub async fn aggregate_events(
    connectors: &[Arc<dyn SourceConnector>],
    window: TimeWindow,
    fetch_timeout: std::time::Duration,
    cancel: &CancellationToken,
) -> AggregateOutcome {
    let results: Arc<Mutex<Vec<(&'static str, Vec<SourceEvent>)>>> =
        Arc::new(Mutex::new(Vec::new()));
    let mut set = JoinSet::new();

    for connector in connectors {
        let name = connector.metadata().name;
        if !connector.is_configured() {
            debug!(source = name, "skipping unconfigured source");
            continue;
        }
        let connector = Arc::clone(connector);
        let results = Arc::clone(&results);
        let cancel = cancel.clone();
        let _ = set.spawn(async move {
            let fetched = tokio::select! {
                () = cancel.cancelled() => {
                    debug!(source = name, "fetch cancelled");
                    return;
                }
                res = tokio::time::timeout(fetch_timeout, connector.fetch_events(&window)) => res,
            };
            match fetched {
                Ok(Ok(events)) => {
                    debug!(source = name, count = events.len(), "source fetch complete");
                    results.lock().push((name, events));
                }
                Ok(Err(error)) => {
                    warn!(source = name, %error, "source fetch failed; continuing without it");
                }
                Err(_) => {
                    warn!(
                        source = name,
                        timeout_ms = fetch_timeout.as_millis() as u64,
                        "source fetch timed out; continuing without it"
                    );
                }
            }
        });
    }
    while set.join_next().await.is_some() {}

    let mut collected = Arc::try_unwrap(results)
        .map_or_else(|arc| arc.lock().clone(), Mutex::into_inner);
    collected.sort_by_key(|(name, _)| *name);

    let mut outcome = AggregateOutcome::default();
    for (name, events) in collected {
        outcome.sources_used.push(name.to_string());
        let _ = outcome.events_by_source.insert(name.to_string(), events.len());
        outcome.events.extend(events);
    }
    outcome
        .events
        .sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    outcome
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use chronolex_connectors::{ConnectorError, ConnectorMetadata};
    use chronolex_core::types::SourceKind;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn event(id: &str, timestamp: &str) -> SourceEvent {
        SourceEvent {
            id: id.to_string(),
            kind: SourceKind::LocalActivity,
            timestamp: ts(timestamp),
            end_timestamp: None,
            duration_minutes: None,
            matter: None,
            subject: id.to_string(),
            description: String::new(),
            evidence: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::new(ts("2026-03-02T00:00:00Z"), ts("2026-03-03T00:00:00Z")).unwrap()
    }

    enum Behavior {
        Events(Vec<SourceEvent>),
        Fail,
        Hang,
        Unconfigured,
    }

    struct StubConnector {
        name: &'static str,
        behavior: Behavior,
    }

    #[async_trait]
    impl SourceConnector for StubConnector {
        fn metadata(&self) -> ConnectorMetadata {
            ConnectorMetadata {
                name: self.name,
                kind: SourceKind::LocalActivity,
                requires_auth: false,
            }
        }

        fn is_configured(&self) -> bool {
            !matches!(self.behavior, Behavior::Unconfigured)
        }

        async fn fetch_events(
            &self,
            _window: &TimeWindow,
        ) -> Result<Vec<SourceEvent>, ConnectorError> {
            match &self.behavior {
                Behavior::Events(events) => Ok(events.clone()),
                Behavior::Fail => Err(ConnectorError::Parse {
                    message: "bad payload".into(),
                }),
                Behavior::Hang => {
                    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                    Ok(Vec::new())
                }
                Behavior::Unconfigured => unreachable!("unconfigured connector was fetched"),
            }
        }
    }

    fn stub(name: &'static str, behavior: Behavior) -> Arc<dyn SourceConnector> {
        Arc::new(StubConnector { name, behavior })
    }

    #[tokio::test]
    async fn merges_sources_in_timestamp_order() {
        let connectors = vec![
            stub(
                "alpha",
                Behavior::Events(vec![
                    event("a-2", "2026-03-02T10:00:00Z"),
                    event("a-1", "2026-03-02T08:00:00Z"),
                ]),
            ),
            stub(
                "beta",
                Behavior::Events(vec![event("b-1", "2026-03-02T09:00:00Z")]),
            ),
        ];
        let cancel = CancellationToken::new();
        let outcome = aggregate_events(
            &connectors,
            window(),
            std::time::Duration::from_secs(5),
            &cancel,
        )
        .await;
        let ids: Vec<_> = outcome.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a-1", "b-1", "a-2"]);
        assert_eq!(outcome.sources_used, vec!["alpha", "beta"]);
        assert_eq!(outcome.events_by_source["alpha"], 2);
        assert_eq!(outcome.events_by_source["beta"], 1);
    }

    #[tokio::test]
    async fn merged_order_is_independent_of_connector_order() {
        let forward = vec![
            stub("alpha", Behavior::Events(vec![event("a-1", "2026-03-02T08:00:00Z")])),
            stub("beta", Behavior::Events(vec![event("b-1", "2026-03-02T09:00:00Z")])),
        ];
        let reversed = vec![
            stub("beta", Behavior::Events(vec![event("b-1", "2026-03-02T09:00:00Z")])),
            stub("alpha", Behavior::Events(vec![event("a-1", "2026-03-02T08:00:00Z")])),
        ];
        let cancel = CancellationToken::new();
        let timeout = std::time::Duration::from_secs(5);
        let first = aggregate_events(&forward, window(), timeout, &cancel).await;
        let second = aggregate_events(&reversed, window(), timeout, &cancel).await;
        assert_eq!(first.events, second.events);
        assert_eq!(first.sources_used, second.sources_used);
    }

    #[tokio::test]
    async fn failing_source_is_isolated() {
        let connectors = vec![
            stub("alpha", Behavior::Events(vec![event("a-1", "2026-03-02T08:00:00Z")])),
            stub("broken", Behavior::Fail),
        ];
        let cancel = CancellationToken::new();
        let outcome = aggregate_events(
            &connectors,
            window(),
            std::time::Duration::from_secs(5),
            &cancel,
        )
        .await;
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.sources_used, vec!["alpha"]);
        assert!(!outcome.events_by_source.contains_key("broken"));
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let connectors = vec![
            stub("alpha", Behavior::Events(vec![event("a-1", "2026-03-02T08:00:00Z")])),
            stub("slow", Behavior::Hang),
        ];
        let cancel = CancellationToken::new();
        let outcome = aggregate_events(
            &connectors,
            window(),
            std::time::Duration::from_millis(50),
            &cancel,
        )
        .await;
        assert_eq!(outcome.sources_used, vec!["alpha"]);
    }

    #[tokio::test]
    async fn unconfigured_source_is_skipped() {
        let connectors = vec![
            stub("alpha", Behavior::Events(vec![event("a-1", "2026-03-02T08:00:00Z")])),
            stub("ghost", Behavior::Unconfigured),
        ];
        let cancel = CancellationToken::new();
        let outcome = aggregate_events(
            &connectors,
            window(),
            std::time::Duration::from_secs(5),
            &cancel,
        )
        .await;
        assert_eq!(outcome.sources_used, vec!["alpha"]);
    }

    #[tokio::test]
    async fn cancelled_run_returns_quickly_with_nothing() {
        let connectors = vec![stub("slow", Behavior::Hang)];
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = aggregate_events(
            &connectors,
            window(),
            std::time::Duration::from_secs(60),
            &cancel,
        )
        .await;
        assert!(outcome.events.is_empty());
        assert!(outcome.sources_used.is_empty());
    }
}
