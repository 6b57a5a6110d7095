//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Ask one external service for the public IPv4 address
//! - [`DnsProvider`]: List, create and update A records via a provider API
//! - [`Notifier`]: Deliver a change notification

pub mod ip_source;
pub mod dns_provider;
pub mod notifier;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord};
pub use notifier::{Notifier, NoopNotifier};
