//! # chronolex-connectors
//!
//! Source connectors for the Chronolex engine. Each connector
//! independently fetches canonical [`chronolex_core::types::SourceEvent`]s
//! for a time window and is tolerant of its own misconfiguration:
//!
//! - [`mailbox::MailboxConnector`]: IMAP mail envelopes
//! - [`local_activity::LocalActivityConnector`]: file modification scans
//! - [`research_log::ResearchLogConnector`]: delimited research-log imports
//! - [`ledger::LedgerConnector`]: practice-management REST API, also the
//!   write-back target for approved entries
//!
//! All connectors implement [`traits::SourceConnector`]. An unconfigured
//! connector reports so via `is_configured()`; a configured connector
//! that fails at runtime raises a [`errors::ConnectorError`] scoped to
//! that source.

#![deny(unsafe_code)]

pub mod errors;
pub mod ledger;
pub mod local_activity;
pub mod mailbox;
pub mod research_log;
pub mod traits;

pub use errors::ConnectorError;
pub use traits::{ConnectorMetadata, SourceConnector};
