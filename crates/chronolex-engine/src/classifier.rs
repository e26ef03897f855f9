//! Two-tier session classifier.
//!
//! Tier one is an ordered keyword table over the session's combined
//! subject/description text; first match wins. Tier two, when enabled
//! and configured, sends the whole run's sessions to an AI provider in
//! one batched request and overwrites the heuristic codes with any
//! validated replies. Every failure in tier two degrades silently to
//! tier one — classification never fails an analysis run.

use chronolex_core::catalog::NormativeCatalog;
use chronolex_core::entry::TaskCode;
use chronolex_core::types::SourceKind;
use chronolex_llm::{ClassificationProvider, SessionDigest};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::sessionizer::Session;

/// A session with its final task code attached.
#[derive(Clone, Debug)]
pub struct ClassifiedSession {
    /// The underlying session.
    pub session: Session,
    /// Final task code (heuristic or AI-assigned).
    pub task_code: TaskCode,
    /// Whether the AI tier produced the code.
    pub ai_classified: bool,
}

/// Ordered keyword rules; the first matching pattern decides the code.
/// Specific document types sit above the generic catch-alls.
const RULES: &[(&[&str], TaskCode)] = &[
    (&["notice of hearing"], TaskCode::DraftNoticeOfHearing),
    (&["affidavit"], TaskCode::DraftAffidavit),
    (&["pleading"], TaskCode::DraftPleadings),
    (&["opinion letter", "legal opinion"], TaskCode::DraftOpinionLetter),
    (&["motion"], TaskCode::DraftMotion),
    (&["contract", "agreement", "addendum"], TaskCode::DraftContract),
    (&["case law", "authorities", "precedent"], TaskCode::CaseLawReview),
    (&["research", "westlaw", "lexis"], TaskCode::LegalResearch),
    (
        &["document review", "review of documents", "reviewed documents", "discovery"],
        TaskCode::DocumentReview,
    ),
    (&["file review", "review file", "review the file"], TaskCode::FileReview),
    (&["hearing", "trial", "oral argument", "court"], TaskCode::CourtAttendance),
    (&["phone", "telephone", "call with", "called", "voicemail"], TaskCode::PhoneCall),
    (&["meeting", "conference", "consultation"], TaskCode::ClientMeeting),
    (&["schedul", "calendar", "appointment"], TaskCode::Scheduling),
    (&["letter to", "draft letter", "correspondence"], TaskCode::DraftLetter),
    (&["email", "e-mail", "re:", "fwd:", "fw:"], TaskCode::EmailCorrespondence),
];

/// Heuristic task code for a session.
///
/// Falls back to a source-kind default when no keyword matches, and to
/// `internal_admin` as the last resort.
#[must_use]
pub fn heuristic_code(session: &Session) -> TaskCode {
    let text = session.classification_text().to_lowercase();
    for (patterns, code) in RULES {
        if patterns.iter().any(|p| text.contains(p)) {
            return *code;
        }
    }
    match session.events[0].kind {
        SourceKind::Mailbox => TaskCode::EmailCorrespondence,
        SourceKind::ResearchLog => TaskCode::LegalResearch,
        SourceKind::LocalActivity | SourceKind::Ledger => TaskCode::InternalAdmin,
    }
}

/// Classify all sessions for a run.
///
/// The heuristic tier always runs. The AI tier runs only when
/// `use_llm` is set and a configured provider is present; its reply
/// replaces heuristic codes per session. Any AI failure, or caller
/// cancellation mid-call, leaves the heuristic codes in place.
pub async fn classify_sessions(
    sessions: Vec<Session>,
    provider: Option<&dyn ClassificationProvider>,
    catalog: &NormativeCatalog,
    use_llm: bool,
    cancel: &CancellationToken,
) -> Vec<ClassifiedSession> {
    let mut classified: Vec<ClassifiedSession> = sessions
        .into_iter()
        .map(|session| {
            let task_code = heuristic_code(&session);
            ClassifiedSession {
                session,
                task_code,
                ai_classified: false,
            }
        })
        .collect();

    if use_llm {
        match provider {
            Some(provider) if provider.is_configured() => {
                tokio::select! {
                    () = cancel.cancelled() => {
                        warn!("cancelled during ai classification; keeping heuristic codes");
                    }
                    () = apply_ai_tier(&mut classified, provider, catalog) => {}
                }
            }
            _ => debug!("ai tier requested but no configured provider; using heuristics"),
        }
    }

    for item in &mut classified {
        let code = Value::String(item.task_code.as_str().to_string());
        for event in &mut item.session.events {
            let _ = event.metadata.insert("taskCode".to_string(), code.clone());
        }
    }
    classified
}

async fn apply_ai_tier(
    classified: &mut [ClassifiedSession],
    provider: &dyn ClassificationProvider,
    catalog: &NormativeCatalog,
) {
    let digests: Vec<SessionDigest> = classified
        .iter()
        .enumerate()
        .map(|(index, item)| SessionDigest {
            index,
            text: item.session.classification_text(),
        })
        .collect();
    let allowed = catalog.code_set();

    match provider.classify_batch(&digests, &allowed).await {
        Ok(replies) => {
            for reply in replies {
                // The provider validates indices and codes, but a code
                // string still has to map onto the closed enum.
                let Some(code) = TaskCode::parse(&reply.task_code) else {
                    continue;
                };
                if let Some(item) = classified.get_mut(reply.index) {
                    item.task_code = code;
                    item.ai_classified = true;
                }
            }
            debug!(sessions = classified.len(), "ai classification applied");
        }
        Err(error) => {
            warn!(%error, "ai classification failed; keeping heuristic codes");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
