//! # chronolex-engine
//!
//! The forensic time-capture / value-billing engine. Reconstructs
//! billable work retrospectively by correlating activity signals from
//! independent sources and converting them into proposed time-ledger
//! entries.
//!
//! Pipeline: connectors → [`aggregator`] → [`sessionizer`] →
//! [`classifier`] → [`policy`] → [`duplicates`] → result.
//! [`gaps`] is a side path over the ledger connector's output.
//!
//! The entry point is [`analyze::TimeCaptureEngine`].

#![deny(unsafe_code)]

pub mod aggregator;
pub mod analyze;
pub mod classifier;
pub mod duplicates;
pub mod gaps;
pub mod policy;
pub mod sessionizer;

pub use analyze::{AnalysisResult, AnalysisStats, AnalyzeRequest, EngineConfig, TimeCaptureEngine};
pub use gaps::BillingGap;
