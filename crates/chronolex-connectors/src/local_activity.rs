//! Local-activity connector — file modification times as work signals.
//!
//! Scans configured filesystem roots for files matching include/exclude
//! glob patterns and whose modification time falls inside the window.
//! Each qualifying file becomes one `circumstantial` event: a file's
//! mtime shows that work happened, not what the work was.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use chronolex_core::types::{Evidence, EvidenceType, SourceEvent, SourceKind, TimeWindow};

use crate::errors::ConnectorError;
use crate::traits::{ConnectorMetadata, SourceConnector};

/// Directories never worth scanning.
const SKIP_DIRS: &[&str] = &[".git", "node_modules", "target", "dist", "__pycache__"];

/// Configuration for the local-activity connector.
#[derive(Clone, Debug, Default)]
pub struct LocalActivityConfig {
    /// Filesystem roots to scan.
    pub roots: Vec<PathBuf>,
    /// Include glob patterns (empty means include everything).
    pub include: Vec<String>,
    /// Exclude glob patterns.
    pub exclude: Vec<String>,
}

/// Local filesystem activity connector.
pub struct LocalActivityConnector {
    config: LocalActivityConfig,
}

impl LocalActivityConnector {
    /// Create a connector from its configuration.
    #[must_use]
    pub fn new(config: LocalActivityConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl SourceConnector for LocalActivityConnector {
    fn metadata(&self) -> ConnectorMetadata {
        ConnectorMetadata {
            name: "local_activity",
            kind: SourceKind::LocalActivity,
            requires_auth: false,
        }
    }

    fn is_configured(&self) -> bool {
        !self.config.roots.is_empty()
    }

    async fn fetch_events(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<SourceEvent>, ConnectorError> {
        if !self.is_configured() {
            return Err(ConnectorError::NotConfigured {
                name: "local_activity".into(),
            });
        }
        let config = self.config.clone();
        let window = *window;
        // Directory walks are synchronous; keep them off the async runtime.
        tokio::task::spawn_blocking(move || scan_blocking(&config, &window))
            .await
            .map_err(|e| ConnectorError::Parse {
                message: format!("scan task failed: {e}"),
            })?
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>, ConnectorError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ConnectorError::Parse {
            message: format!("bad glob pattern {pattern:?}: {e}"),
        })?;
        let _ = builder.add(glob);
    }
    let set = builder.build().map_err(|e| ConnectorError::Parse {
        message: format!("glob set: {e}"),
    })?;
    Ok(Some(set))
}

/// Whether a relative path passes the include/exclude filters.
fn path_matches(rel_path: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    if let Some(exclude) = exclude {
        if exclude.is_match(rel_path) {
            return false;
        }
        if rel_path
            .file_name()
            .is_some_and(|name| exclude.is_match(Path::new(name)))
        {
            return false;
        }
    }
    match include {
        Some(include) => {
            include.is_match(rel_path)
                || rel_path
                    .file_name()
                    .is_some_and(|name| include.is_match(Path::new(name)))
        }
        None => true,
    }
}

/// Build the canonical event for one modified file.
fn file_event(index: usize, rel_path: &Path, modified: DateTime<Utc>) -> SourceEvent {
    let rel = rel_path.to_string_lossy().into_owned();
    SourceEvent {
        id: format!("local_activity-{index}"),
        kind: SourceKind::LocalActivity,
        timestamp: modified,
        end_timestamp: None,
        duration_minutes: None,
        matter: None,
        subject: rel.clone(),
        description: format!("File modified: {rel}"),
        evidence: vec![Evidence {
            evidence_type: EvidenceType::Circumstantial,
            source_kind: SourceKind::LocalActivity,
            description: format!("Modification time of {rel}"),
            timestamp: modified,
            locator: Some(rel),
            metadata: serde_json::Map::new(),
        }],
        metadata: serde_json::Map::new(),
    }
}

fn scan_blocking(
    config: &LocalActivityConfig,
    window: &TimeWindow,
) -> Result<Vec<SourceEvent>, ConnectorError> {
    let include = build_glob_set(&config.include)?;
    let exclude = build_glob_set(&config.exclude)?;

    let mut events = Vec::new();
    for root in &config.roots {
        let walker = walkdir::WalkDir::new(root).into_iter().filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            if e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.') {
                return false;
            }
            !(e.file_type().is_dir() && SKIP_DIRS.contains(&name.as_ref()))
        });

        for entry in walker {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            let Ok(modified) = meta.modified() else { continue };
            let modified: DateTime<Utc> = modified.into();
            if !window.contains(modified) {
                continue;
            }
            let rel_path = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if !path_matches(rel_path, include.as_ref(), exclude.as_ref()) {
                continue;
            }
            events.push(file_event(events.len(), rel_path, modified));
        }
    }

    debug!(count = events.len(), "local activity scan complete");
    Ok(events)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn wide_window() -> TimeWindow {
        let now = Utc::now();
        TimeWindow::new(now - Duration::days(1), now + Duration::days(1)).unwrap()
    }

    #[test]
    fn unconfigured_without_roots() {
        let connector = LocalActivityConnector::new(LocalActivityConfig::default());
        assert!(!connector.is_configured());
    }

    #[tokio::test]
    async fn fetch_on_unconfigured_reports_not_configured() {
        let connector = LocalActivityConnector::new(LocalActivityConfig::default());
        let err = connector.fetch_events(&wide_window()).await.unwrap_err();
        assert_matches!(err, ConnectorError::NotConfigured { .. });
    }

    #[tokio::test]
    async fn scans_files_modified_inside_window() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("brief.docx"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"y").unwrap();

        let connector = LocalActivityConnector::new(LocalActivityConfig {
            roots: vec![dir.path().to_path_buf()],
            include: Vec::new(),
            exclude: Vec::new(),
        });
        let mut events = connector.fetch_events(&wide_window()).await.unwrap();
        events.sort_by(|a, b| a.subject.cmp(&b.subject));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].subject, "brief.docx");
        assert_eq!(events[0].kind, SourceKind::LocalActivity);
        assert_eq!(
            events[0].evidence[0].evidence_type,
            EvidenceType::Circumstantial
        );
        assert!(events[0].duration_minutes.is_none());
    }

    #[tokio::test]
    async fn include_and_exclude_patterns_filter_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("brief.docx"), b"x").unwrap();
        std::fs::write(dir.path().join("draft.docx"), b"y").unwrap();
        std::fs::write(dir.path().join("scratch.tmp"), b"z").unwrap();

        let connector = LocalActivityConnector::new(LocalActivityConfig {
            roots: vec![dir.path().to_path_buf()],
            include: vec!["*.docx".into()],
            exclude: vec!["draft*".into()],
        });
        let events = connector.fetch_events(&wide_window()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].subject, "brief.docx");
    }

    #[tokio::test]
    async fn files_outside_window_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.docx"), b"x").unwrap();

        // A window entirely in the past cannot contain a fresh mtime.
        let start = Utc::now() - Duration::days(30);
        let window = TimeWindow::new(start, start + Duration::days(1)).unwrap();
        let connector = LocalActivityConnector::new(LocalActivityConfig {
            roots: vec![dir.path().to_path_buf()],
            include: Vec::new(),
            exclude: Vec::new(),
        });
        let events = connector.fetch_events(&window).await.unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn path_matches_checks_file_name_against_globs() {
        let include = build_glob_set(&["*.docx".to_string()]).unwrap();
        assert!(path_matches(
            Path::new("matters/acme/brief.docx"),
            include.as_ref(),
            None
        ));
        assert!(!path_matches(
            Path::new("matters/acme/brief.txt"),
            include.as_ref(),
            None
        ));
    }
}
