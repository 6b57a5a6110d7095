//! Error types for the DDNS system
//!
//! The variants mirror how far a failure is allowed to travel:
//!
//! - [`Error::Config`] is fatal and only ever produced at startup.
//! - [`Error::Resolution`] aborts one reconciliation cycle.
//! - [`Error::ProviderFetch`] skips one domain for one cycle.
//! - [`Error::ProviderWrite`] fails one record write.
//! - [`Error::Notify`] is logged and otherwise ignored.
//!
//! The remaining variants are plumbing used by the adapters before they are
//! classified into one of the above by the reconciler.

use std::fmt;
use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single IP source failed during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    /// Source name (usually its URL)
    pub source: String,
    /// Human-readable failure reason
    pub reason: String,
}

impl SourceFailure {
    pub fn new(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every configured IP source failed this cycle
    #[error("IP resolution failed: {}", format_failures(.failures))]
    Resolution {
        /// One entry per source that was tried
        failures: Vec<SourceFailure>,
    },

    /// Listing records for a domain failed
    #[error("Failed to fetch records for {domain}: {message}")]
    ProviderFetch {
        /// Fully-qualified domain being reconciled
        domain: String,
        /// Underlying provider failure
        message: String,
    },

    /// Creating or updating a record failed
    #[error("Failed to write record for {domain}: {message}")]
    ProviderWrite {
        /// Fully-qualified domain being reconciled
        domain: String,
        /// Underlying provider failure
        message: String,
    },

    /// Notification delivery failed
    #[error("Notification failed: {0}")]
    Notify(String),

    /// A single IP source failed (network, status or parse)
    #[error("IP source error: {0}")]
    IpSource(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

fn format_failures(failures: &[SourceFailure]) -> String {
    if failures.is_empty() {
        return "no IP sources configured".to_string();
    }

    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a notification error
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Classify a provider failure raised while listing records
    pub fn provider_fetch(domain: impl Into<String>, source: &Error) -> Self {
        Self::ProviderFetch {
            domain: domain.into(),
            message: source.to_string(),
        }
    }

    /// Classify a provider failure raised while creating or updating a record
    pub fn provider_write(domain: impl Into<String>, source: &Error) -> Self {
        Self::ProviderWrite {
            domain: domain.into(),
            message: source.to_string(),
        }
    }

    /// Whether this error must stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
