//! External IP resolution
//!
//! [`IpResolver`] tries its sources strictly in priority order and returns
//! the first address any of them produces. Later sources are not contacted
//! once one succeeds. If every source fails, the caller gets
//! [`Error::Resolution`] carrying each source's failure reason.
//!
//! There are no retries within one resolution; the next scheduled cycle is
//! the retry.

use crate::error::{Error, Result, SourceFailure};
use crate::traits::IpSource;
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// Ordered list of independent IP sources with first-success semantics
pub struct IpResolver {
    sources: Vec<Box<dyn IpSource>>,
}

impl IpResolver {
    /// Create a resolver over `sources`, highest priority first
    pub fn new(sources: Vec<Box<dyn IpSource>>) -> Self {
        Self { sources }
    }

    /// Number of configured sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is configured
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Resolve the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: From the first source that succeeded
    /// - `Err(Error::Resolution)`: Every source failed
    pub async fn resolve(&self) -> Result<Ipv4Addr> {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match source.fetch().await {
                Ok(ip) if is_plausible(ip) => {
                    debug!("Resolved external IP {} via {}", ip, source.name());
                    return Ok(ip);
                }
                Ok(ip) => {
                    warn!("IP source {} returned unusable address {}", source.name(), ip);
                    failures.push(SourceFailure::new(
                        source.name(),
                        format!("unusable address {}", ip),
                    ));
                }
                Err(e) => {
                    warn!("IP source {} failed: {}", source.name(), e);
                    failures.push(SourceFailure::new(source.name(), e.to_string()));
                }
            }
        }

        Err(Error::Resolution { failures })
    }
}

/// Reject addresses that can never be a public A record value
fn is_plausible(ip: Ipv4Addr) -> bool {
    !(ip.is_unspecified() || ip.is_broadcast() || ip.is_multicast() || ip.is_loopback())
}
