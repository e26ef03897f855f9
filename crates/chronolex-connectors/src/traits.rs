//! The [`SourceConnector`] trait — the contract every source implements.

use async_trait::async_trait;
use chronolex_core::types::{SourceEvent, SourceKind, TimeWindow};

use crate::errors::ConnectorError;

/// Static description of a connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectorMetadata {
    /// Connector name, used in logs and `toolsUsed`.
    pub name: &'static str,
    /// Which source kind it produces.
    pub kind: SourceKind,
    /// Whether the source requires credentials.
    pub requires_auth: bool,
}

/// A source of canonical activity events.
///
/// Implementors must be `Send + Sync`; fetches run as concurrent tasks.
/// An unconfigured connector must report so via
/// [`is_configured`](SourceConnector::is_configured) rather than
/// erroring from [`fetch_events`](SourceConnector::fetch_events).
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Connector description.
    fn metadata(&self) -> ConnectorMetadata;

    /// Whether the connector has everything it needs to fetch.
    fn is_configured(&self) -> bool;

    /// Fetch canonical events for the window.
    ///
    /// Events outside the half-open window must not be returned, even
    /// when the underlying protocol only filters at day granularity.
    async fn fetch_events(&self, window: &TimeWindow)
    -> Result<Vec<SourceEvent>, ConnectorError>;
}
