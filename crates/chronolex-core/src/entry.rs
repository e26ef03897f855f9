//! Proposed time-ledger entries and their supporting vocabulary.
//!
//! - [`TaskCode`]: Closed set of billable task types
//! - [`ActivityCategory`]: Coarse grouping for reporting
//! - [`Complexity`]: Multiplier tier for normative time
//! - [`ProposedEntry`]: One reconstructed, not-yet-approved entry
//! - [`DuplicateMatch`]: Annotation linking two likely-duplicate entries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Evidence, MatterRef};

// ─────────────────────────────────────────────────────────────────────────────
// Task codes
// ─────────────────────────────────────────────────────────────────────────────

/// The closed set of task codes known to the engine.
///
/// Wire format is `snake_case` (e.g. `draft_notice_of_hearing`), the
/// same strings the AI classifier is constrained to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCode {
    /// Drafting a notice of hearing.
    DraftNoticeOfHearing,
    /// Drafting a motion.
    DraftMotion,
    /// Drafting an affidavit.
    DraftAffidavit,
    /// Drafting pleadings.
    DraftPleadings,
    /// Drafting or revising a contract.
    DraftContract,
    /// Drafting an opinion letter.
    DraftOpinionLetter,
    /// Reading or writing email.
    EmailCorrespondence,
    /// Drafting a formal letter.
    DraftLetter,
    /// Telephone call.
    PhoneCall,
    /// Meeting with the client.
    ClientMeeting,
    /// Calendaring and scheduling.
    Scheduling,
    /// Legal research.
    LegalResearch,
    /// Reviewing case law.
    CaseLawReview,
    /// Reviewing documents produced or received.
    DocumentReview,
    /// Reviewing the matter file.
    FileReview,
    /// Attending court.
    CourtAttendance,
    /// Catch-all internal / administrative work.
    InternalAdmin,
}

impl TaskCode {
    /// Every known code, in catalog order.
    pub const ALL: &'static [Self] = &[
        Self::DraftNoticeOfHearing,
        Self::DraftMotion,
        Self::DraftAffidavit,
        Self::DraftPleadings,
        Self::DraftContract,
        Self::DraftOpinionLetter,
        Self::EmailCorrespondence,
        Self::DraftLetter,
        Self::PhoneCall,
        Self::ClientMeeting,
        Self::Scheduling,
        Self::LegalResearch,
        Self::CaseLawReview,
        Self::DocumentReview,
        Self::FileReview,
        Self::CourtAttendance,
        Self::InternalAdmin,
    ];

    /// Stable snake_case identifier.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DraftNoticeOfHearing => "draft_notice_of_hearing",
            Self::DraftMotion => "draft_motion",
            Self::DraftAffidavit => "draft_affidavit",
            Self::DraftPleadings => "draft_pleadings",
            Self::DraftContract => "draft_contract",
            Self::DraftOpinionLetter => "draft_opinion_letter",
            Self::EmailCorrespondence => "email_correspondence",
            Self::DraftLetter => "draft_letter",
            Self::PhoneCall => "phone_call",
            Self::ClientMeeting => "client_meeting",
            Self::Scheduling => "scheduling",
            Self::LegalResearch => "legal_research",
            Self::CaseLawReview => "case_law_review",
            Self::DocumentReview => "document_review",
            Self::FileReview => "file_review",
            Self::CourtAttendance => "court_attendance",
            Self::InternalAdmin => "internal_admin",
        }
    }

    /// Parse a snake_case identifier. Returns `None` for unknown codes.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// Whether this task is naturally repeated many times per day.
    ///
    /// Pairs of entries with repeatable codes on the same date need a
    /// higher duplicate score before being flagged.
    #[must_use]
    pub fn is_naturally_repeatable(self) -> bool {
        matches!(
            self,
            Self::EmailCorrespondence | Self::PhoneCall | Self::Scheduling | Self::LegalResearch
        )
    }
}

impl std::fmt::Display for TaskCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories and complexity
// ─────────────────────────────────────────────────────────────────────────────

/// Coarse activity grouping for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityCategory {
    /// Drafting documents.
    Drafting,
    /// Written correspondence.
    Correspondence,
    /// Legal research.
    Research,
    /// Court appearances.
    CourtAppearance,
    /// Calls and meetings with the client.
    ClientCommunication,
    /// Reviewing documents and files.
    Review,
    /// Internal administration.
    Administration,
}

/// Complexity tier scaling normative minutes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Complexity {
    /// Routine work.
    Low,
    /// Typical work.
    #[default]
    Medium,
    /// Involved work.
    High,
    /// First-impression / novel work.
    Novel,
}

impl Complexity {
    /// Multiplier applied to catalog base minutes.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Low => 0.7,
            Self::Medium => 1.0,
            Self::High => 1.5,
            Self::Novel => 2.0,
        }
    }

    /// Parse a lowercase tier name, as found in event metadata.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "novel" => Some(Self::Novel),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Proposed entries
// ─────────────────────────────────────────────────────────────────────────────

/// Which policy branch produced the recommended value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Basis {
    /// Professional-standard baseline only.
    Normative,
    /// Observed duration only.
    Actual,
    /// Blend of the two.
    Hybrid,
}

/// One reconstructed time-ledger entry, proposed for review.
///
/// Created once per classified group per run and never mutated in
/// place; duplicate findings are a separate [`DuplicateMatch`] list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedEntry {
    /// Unique per run.
    pub id: String,
    /// Matter attribution (absent for internal work).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matter: Option<MatterRef>,
    /// Calendar day (UTC) the work is attributed to.
    pub date: NaiveDate,
    /// Classified task code.
    pub task_code: TaskCode,
    /// Catalog label for the code.
    pub task_label: String,
    /// Summed observed minutes, if any event carried a duration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_minutes: Option<f64>,
    /// Professional-standard minutes for the group.
    pub normative_minutes: f64,
    /// Policy-blended, rounded recommendation.
    pub recommended_minutes: f64,
    /// Which branch produced the recommendation.
    pub basis: Basis,
    /// Narrative description for the ledger.
    pub description: String,
    /// Coarse reporting category.
    pub activity_category: ActivityCategory,
    /// IDs of the source events backing the entry.
    pub source_event_ids: Vec<String>,
    /// Evidence carried over from the source events.
    pub evidence: Vec<Evidence>,
    /// Complexity tier used for the normative computation.
    pub complexity: Complexity,
    /// Confidence in the reconstruction, 0.0–1.0.
    pub confidence: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Duplicate matches
// ─────────────────────────────────────────────────────────────────────────────

/// Annotation flagging two proposed entries as likely duplicates.
///
/// Derived, read-only, produced fresh each run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMatch {
    /// First entry ID.
    pub entry1_id: String,
    /// Second entry ID.
    pub entry2_id: String,
    /// Cumulative similarity score, 0–100.
    pub similarity: u32,
    /// Signals that contributed to the score.
    pub reasons: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
