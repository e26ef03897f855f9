//! # chronolex-core
//!
//! Foundation types, errors, and reference data for the Chronolex
//! forensic time-capture engine.
//!
//! This crate provides the shared vocabulary that all other Chronolex
//! crates depend on:
//!
//! - **Windows and events**: [`types::TimeWindow`], [`types::SourceEvent`],
//!   [`types::Evidence`], [`types::MatterRef`]
//! - **Proposed entries**: [`entry::ProposedEntry`], [`entry::DuplicateMatch`]
//! - **Task vocabulary**: [`entry::TaskCode`], [`entry::ActivityCategory`],
//!   [`entry::Complexity`]
//! - **Reference data**: [`catalog::NormativeCatalog`] of baseline minutes
//! - **Policy**: [`policy::BillingPolicy`] and [`policy::EngineFlags`]
//! - **Errors**: [`errors::EngineError`] hierarchy via `thiserror`
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other chronolex crates.

#![deny(unsafe_code)]

pub mod catalog;
pub mod entry;
pub mod errors;
pub mod logging;
pub mod policy;
pub mod types;
