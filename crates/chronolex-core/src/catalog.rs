//! # Normative Catalog
//!
//! Reference table of task code → professional-standard baseline minutes
//! and activity category. The catalog ships with compiled defaults and
//! accepts caller overrides per item; the policy engine owns the
//! arithmetic that scales these baselines.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entry::{ActivityCategory, TaskCode};

/// One catalog row: baseline minutes for a task code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormativeCatalogItem {
    /// Task code.
    pub code: TaskCode,
    /// Human-readable label, used on proposed entries.
    pub label: String,
    /// Professional-standard baseline minutes at medium complexity.
    pub base_minutes: f64,
    /// Coarse reporting category.
    pub category: ActivityCategory,
}

/// The normative catalog: static defaults plus caller overrides.
#[derive(Clone, Debug)]
pub struct NormativeCatalog {
    items: HashMap<TaskCode, NormativeCatalogItem>,
}

/// Compiled default baselines: `(code, label, base minutes, category)`.
const DEFAULT_ITEMS: &[(TaskCode, &str, f64, ActivityCategory)] = &[
    (
        TaskCode::DraftNoticeOfHearing,
        "Draft notice of hearing",
        30.0,
        ActivityCategory::Drafting,
    ),
    (TaskCode::DraftMotion, "Draft motion", 120.0, ActivityCategory::Drafting),
    (TaskCode::DraftAffidavit, "Draft affidavit", 90.0, ActivityCategory::Drafting),
    (TaskCode::DraftPleadings, "Draft pleadings", 150.0, ActivityCategory::Drafting),
    (TaskCode::DraftContract, "Draft contract", 180.0, ActivityCategory::Drafting),
    (
        TaskCode::DraftOpinionLetter,
        "Draft opinion letter",
        120.0,
        ActivityCategory::Drafting,
    ),
    (
        TaskCode::EmailCorrespondence,
        "Email correspondence",
        6.0,
        ActivityCategory::Correspondence,
    ),
    (TaskCode::DraftLetter, "Draft letter", 30.0, ActivityCategory::Correspondence),
    (TaskCode::PhoneCall, "Telephone call", 12.0, ActivityCategory::ClientCommunication),
    (
        TaskCode::ClientMeeting,
        "Client meeting",
        60.0,
        ActivityCategory::ClientCommunication,
    ),
    (TaskCode::Scheduling, "Scheduling", 6.0, ActivityCategory::Administration),
    (TaskCode::LegalResearch, "Legal research", 60.0, ActivityCategory::Research),
    (TaskCode::CaseLawReview, "Case law review", 90.0, ActivityCategory::Research),
    (TaskCode::DocumentReview, "Document review", 45.0, ActivityCategory::Review),
    (TaskCode::FileReview, "File review", 30.0, ActivityCategory::Review),
    (
        TaskCode::CourtAttendance,
        "Court attendance",
        180.0,
        ActivityCategory::CourtAppearance,
    ),
    (
        TaskCode::InternalAdmin,
        "Internal / administrative",
        15.0,
        ActivityCategory::Administration,
    ),
];

impl Default for NormativeCatalog {
    fn default() -> Self {
        let items = DEFAULT_ITEMS
            .iter()
            .map(|&(code, label, base_minutes, category)| {
                (
                    code,
                    NormativeCatalogItem {
                        code,
                        label: label.to_string(),
                        base_minutes,
                        category,
                    },
                )
            })
            .collect();
        Self { items }
    }
}

impl NormativeCatalog {
    /// Default catalog with caller-supplied rows layered over it.
    ///
    /// An override replaces the default row for its code entirely.
    #[must_use]
    pub fn with_overrides(overrides: Vec<NormativeCatalogItem>) -> Self {
        let mut catalog = Self::default();
        for item in overrides {
            let _ = catalog.items.insert(item.code, item);
        }
        catalog
    }

    /// Look up the row for a task code.
    ///
    /// Every [`TaskCode`] variant has a default row, so lookups on a
    /// default-based catalog cannot miss.
    #[must_use]
    pub fn get(&self, code: TaskCode) -> &NormativeCatalogItem {
        self.items.get(&code).unwrap_or_else(|| {
            // Overrides can only replace rows, never remove them.
            unreachable!("catalog row missing for {code}")
        })
    }

    /// All known task code strings, for constraining the AI classifier.
    #[must_use]
    pub fn code_set(&self) -> Vec<&'static str> {
        TaskCode::ALL.iter().map(|c| c.as_str()).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
