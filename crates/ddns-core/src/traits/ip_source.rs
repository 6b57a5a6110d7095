// # IP Source Trait
//
// Defines the interface for asking one external service for our public IPv4
// address.
//
// ## Implementations
//
// - HTTP echo services: `ddns-ip-http` crate
//
// Sources are individually unreliable. They are combined in priority order
// by [`crate::IpResolver`], which stops at the first success.

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// # Trust Level: Untrusted
///
/// - One bounded-time request per call
/// - Any non-success status, network error, or unparseable body is an `Err`
/// - No retries and no caching between calls: the address may change
///   between cycles and that is the reason cycles repeat
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The address reported by this source
    /// - `Err(Error)`: If this source failed for any reason
    async fn fetch(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Name used in logs and in resolution failure reports
    fn name(&self) -> &str;
}
