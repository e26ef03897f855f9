//! Connector error types.
//!
//! Unified error enum for all source connectors. The aggregator catches
//! these per source; they never abort a whole analysis run.

use std::io;

use thiserror::Error;

/// Errors that can occur while fetching from a source.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The connector is missing required credentials/paths.
    #[error("connector not configured: {name}")]
    NotConfigured {
        /// Connector name.
        name: String,
    },

    /// Authentication with the source failed.
    #[error("auth error: {message}")]
    Auth {
        /// Description of the auth failure.
        message: String,
    },

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source API returned an error status.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or description.
        message: String,
    },

    /// Generic I/O error (filesystem scan, import file read).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A fetched record could not be parsed.
    #[error("parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// Mail/session protocol failure.
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the protocol failure.
        message: String,
    },

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<csv::Error> for ConnectorError {
    fn from(err: csv::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

impl From<imap::error::Error> for ConnectorError {
    fn from(err: imap::error::Error) -> Self {
        match err {
            imap::error::Error::Io(e) => Self::Io(e),
            other => Self::Protocol {
                message: other.to_string(),
            },
        }
    }
}

impl From<native_tls::Error> for ConnectorError {
    fn from(err: native_tls::Error) -> Self {
        Self::Protocol {
            message: format!("tls: {err}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_configured_display() {
        let err = ConnectorError::NotConfigured {
            name: "mailbox".into(),
        };
        assert_eq!(err.to_string(), "connector not configured: mailbox");
    }

    #[test]
    fn api_display_includes_status() {
        let err = ConnectorError::Api {
            status: 429,
            message: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "api error (429): rate limited");
    }

    #[test]
    fn from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = ConnectorError::from(io_err);
        assert!(matches!(err, ConnectorError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }
}
