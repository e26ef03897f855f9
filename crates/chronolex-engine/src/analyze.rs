//! The engine entry point.
//!
//! [`TimeCaptureEngine`] wires the pipeline together: build connectors
//! from the request's source specs, aggregate, sessionize, classify,
//! apply the billing policy, then scan for duplicates. Bad requests
//! fail fast with a validation error; everything downstream degrades
//! per source.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use chronolex_connectors::ledger::{ApprovedEntry, LedgerConfig, LedgerConnector, PushOutcome};
use chronolex_connectors::local_activity::{LocalActivityConfig, LocalActivityConnector};
use chronolex_connectors::mailbox::{MailboxConfig, MailboxConnector};
use chronolex_connectors::research_log::{ResearchLogConfig, ResearchLogConnector};
use chronolex_connectors::{ConnectorError, SourceConnector};
use chronolex_core::catalog::NormativeCatalog;
use chronolex_core::entry::{DuplicateMatch, ProposedEntry};
use chronolex_core::errors::EngineError;
use chronolex_core::policy::{BillingPolicy, EngineFlags};
use chronolex_core::types::TimeWindow;
use chronolex_llm::ClassificationProvider;
use chronolex_settings::types::ChronolexSettings;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregator::aggregate_events;
use crate::classifier::classify_sessions;
use crate::duplicates::detect_duplicates;
use crate::gaps::{identify_gaps, BillingGap};
use crate::policy::build_entries;
use crate::sessionizer::sessionize;

// ─────────────────────────────────────────────────────────────────────────────
// Request types
// ─────────────────────────────────────────────────────────────────────────────

fn default_port() -> u16 {
    993
}
fn default_folder() -> String {
    "INBOX".to_string()
}
fn default_mail_quantum() -> f64 {
    6.0
}

/// Mailbox source parameters for one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxSpec {
    /// IMAP host.
    pub host: Option<String>,
    /// IMAP TLS port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Account username.
    pub username: Option<String>,
    /// Account password.
    pub password: Option<String>,
    /// Folder to search.
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Duration quantum per message, in minutes.
    #[serde(default = "default_mail_quantum")]
    pub message_duration_minutes: f64,
}

/// Local filesystem scan parameters for one run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalPathsSpec {
    /// Roots to scan.
    pub roots: Vec<PathBuf>,
    /// Include glob patterns (empty means everything).
    pub include: Vec<String>,
    /// Exclude glob patterns.
    pub exclude: Vec<String>,
}

/// Ledger endpoint parameters for one run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSpec {
    /// Base URL of the ledger REST API.
    pub base_url: Option<String>,
    /// Bearer token.
    pub api_token: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl LedgerSpec {
    fn config(&self) -> LedgerConfig {
        LedgerConfig {
            base_url: self.base_url.clone(),
            api_token: self.api_token.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Which sources a run draws from.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourcesSpec {
    /// IMAP mailbox.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mailbox: Option<MailboxSpec>,
    /// Local file activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_paths: Option<LocalPathsSpec>,
    /// Research-log export files.
    pub research_csv_paths: Vec<PathBuf>,
    /// Practice-management ledger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<LedgerSpec>,
}

impl SourcesSpec {
    /// Instantiate connectors for every source the request names.
    fn connectors(&self) -> Vec<Arc<dyn SourceConnector>> {
        let mut connectors: Vec<Arc<dyn SourceConnector>> = Vec::new();
        if let Some(mailbox) = &self.mailbox {
            connectors.push(Arc::new(MailboxConnector::new(MailboxConfig {
                host: mailbox.host.clone(),
                port: mailbox.port,
                username: mailbox.username.clone(),
                password: mailbox.password.clone(),
                folder: mailbox.folder.clone(),
                message_duration_minutes: mailbox.message_duration_minutes,
            })));
        }
        if let Some(local) = &self.local_paths {
            connectors.push(Arc::new(LocalActivityConnector::new(LocalActivityConfig {
                roots: local.roots.clone(),
                include: local.include.clone(),
                exclude: local.exclude.clone(),
            })));
        }
        if !self.research_csv_paths.is_empty() {
            connectors.push(Arc::new(ResearchLogConnector::new(ResearchLogConfig {
                paths: self.research_csv_paths.clone(),
            })));
        }
        if let Some(ledger) = &self.ledger {
            connectors.push(Arc::new(LedgerConnector::new(ledger.config())));
        }
        connectors
    }
}

/// One analysis request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Half-open UTC window to reconstruct.
    pub window: TimeWindow,
    /// Sources to draw from.
    pub sources: SourcesSpec,
    /// Valuation policy.
    #[serde(default)]
    pub policy: BillingPolicy,
    /// Feature toggles.
    #[serde(default)]
    pub flags: EngineFlags,
}

// ─────────────────────────────────────────────────────────────────────────────
// Result types
// ─────────────────────────────────────────────────────────────────────────────

/// Run-level summary numbers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    /// Events aggregated across all sources.
    pub total_events: usize,
    /// Proposed entries emitted.
    pub total_proposals: usize,
    /// Sum of recommended minutes across proposals.
    pub total_recommended_minutes: f64,
    /// Sum of observed minutes across proposals that had any.
    pub total_actual_minutes: f64,
    /// Event count per contributing source.
    pub events_by_source: HashMap<String, usize>,
}

/// Everything one analysis run produces.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// The window that was analyzed.
    pub window: TimeWindow,
    /// Sources (and tiers) that contributed to the run.
    pub tools_used: Vec<String>,
    /// Proposed entries, in deterministic order.
    pub proposals: Vec<ProposedEntry>,
    /// Likely-duplicate pairs among the proposals.
    pub duplicates: Vec<DuplicateMatch>,
    /// Summary numbers.
    pub stats: AnalysisStats,
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable engine tuning, fixed at construction.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Gap (minutes) that splits two events into separate sessions.
    pub session_gap_minutes: i64,
    /// Per-connector fetch deadline in milliseconds.
    pub fetch_timeout_ms: u64,
    /// Day threshold (minutes) below which a billing gap is reported.
    pub gap_threshold_minutes: f64,
    /// Normative baseline catalog.
    pub catalog: NormativeCatalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_gap_minutes: 30,
            fetch_timeout_ms: 30_000,
            gap_threshold_minutes: 120.0,
            catalog: NormativeCatalog::default(),
        }
    }
}

impl EngineConfig {
    /// Build engine tuning from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &ChronolexSettings) -> Self {
        Self {
            session_gap_minutes: settings.engine.session_gap_minutes,
            fetch_timeout_ms: settings.engine.fetch_timeout_ms,
            gap_threshold_minutes: settings.engine.gap_threshold_minutes,
            catalog: NormativeCatalog::default(),
        }
    }
}

/// The forensic time-capture engine.
///
/// Holds tuning and an optional AI classification provider; every
/// analysis runs against request-scoped sources and policy.
pub struct TimeCaptureEngine {
    config: EngineConfig,
    classifier: Option<Arc<dyn ClassificationProvider>>,
}

impl TimeCaptureEngine {
    /// Create an engine without an AI tier.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            classifier: None,
        }
    }

    /// Attach an AI classification provider.
    #[must_use]
    pub fn with_classifier(mut self, provider: Arc<dyn ClassificationProvider>) -> Self {
        self.classifier = Some(provider);
        self
    }

    /// Run one analysis.
    ///
    /// Fails fast on an invalid window or when no usable source is
    /// specified; source-level failures after that point are isolated
    /// and the run proceeds with what remains.
    pub async fn analyze(
        &self,
        request: &AnalyzeRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, EngineError> {
        let window = validated_window(&request.window)?;
        let connectors = request.sources.connectors();
        if !connectors.iter().any(|c| c.is_configured()) {
            return Err(EngineError::Validation {
                message: "no usable sources specified".to_string(),
            });
        }

        info!(
            start = %window.start,
            end = %window.end,
            sources = connectors.len(),
            "analysis run started"
        );
        let outcome = aggregate_events(
            &connectors,
            window,
            std::time::Duration::from_millis(self.config.fetch_timeout_ms),
            cancel,
        )
        .await;

        let sessions = sessionize(
            &outcome.events,
            Duration::minutes(self.config.session_gap_minutes),
        );
        debug!(
            events = outcome.events.len(),
            sessions = sessions.len(),
            "sessionization complete"
        );

        let classified = classify_sessions(
            sessions,
            self.classifier.as_deref(),
            &self.config.catalog,
            request.flags.use_llm,
            cancel,
        )
        .await;
        let ai_used = classified.iter().any(|c| c.ai_classified);

        let proposals = build_entries(
            &classified,
            &self.config.catalog,
            &request.policy,
            &request.flags,
        );
        let duplicates = if request.flags.enable_dupe_check {
            detect_duplicates(&proposals)
        } else {
            Vec::new()
        };

        let mut tools_used = outcome.sources_used.clone();
        if ai_used {
            tools_used.push("ai_classifier".to_string());
        }
        let stats = AnalysisStats {
            total_events: outcome.events.len(),
            total_proposals: proposals.len(),
            total_recommended_minutes: proposals.iter().map(|p| p.recommended_minutes).sum(),
            total_actual_minutes: proposals.iter().filter_map(|p| p.actual_minutes).sum(),
            events_by_source: outcome.events_by_source,
        };
        info!(
            proposals = stats.total_proposals,
            duplicates = duplicates.len(),
            recommended_minutes = stats.total_recommended_minutes,
            "analysis run complete"
        );

        Ok(AnalysisResult {
            window,
            tools_used,
            proposals,
            duplicates,
            stats,
        })
    }

    /// Report under-recorded days in the window.
    ///
    /// Requires a configured ledger; gaps are measured against recorded
    /// ledger time only.
    pub async fn find_gaps(
        &self,
        window: &TimeWindow,
        ledger: Option<&LedgerSpec>,
    ) -> Result<Vec<BillingGap>, EngineError> {
        let window = validated_window(window)?;
        let connector = ledger
            .map(|spec| LedgerConnector::new(spec.config()))
            .filter(SourceConnector::is_configured)
            .ok_or(EngineError::Configuration {
                connector: "ledger".to_string(),
            })?;

        let recorded = connector
            .fetch_events(&window)
            .await
            .map_err(|e| source_error("ledger", &e))?;
        Ok(identify_gaps(
            &window,
            &recorded,
            self.config.gap_threshold_minutes,
        ))
    }

    /// Write approved entries back to the ledger.
    ///
    /// Outcomes are per entry; one rejection never aborts the batch. A
    /// dry run validates and maps without calling the API.
    pub async fn push_entries(
        &self,
        ledger: &LedgerSpec,
        entries: &[ApprovedEntry],
        dry_run: bool,
    ) -> Result<Vec<PushOutcome>, EngineError> {
        let connector = LedgerConnector::new(ledger.config());
        connector
            .record_entries(entries, dry_run)
            .await
            .map_err(|e| match e {
                ConnectorError::NotConfigured { .. } => EngineError::Configuration {
                    connector: "ledger".to_string(),
                },
                other => source_error("ledger", &other),
            })
    }
}

fn validated_window(window: &TimeWindow) -> Result<TimeWindow, EngineError> {
    // Requests arrive deserialized, bypassing TimeWindow::new.
    TimeWindow::new(window.start, window.end)
}

fn source_error(name: &str, error: &ConnectorError) -> EngineError {
    EngineError::Source {
        name: name.to_string(),
        message: error.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
