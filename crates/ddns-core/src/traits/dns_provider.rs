// # DNS Provider Trait
//
// Defines the interface for reading and writing A records via a provider API.
//
// ## Implementations
//
// - Alibaba Cloud DNS: `ddns-provider-aliyun` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// let records = provider.list_records("www", "example.com").await?;
// for record in records.iter().filter(|r| r.rr == "www") {
//     provider.update_record(&record.record_id, "www", ip).await?;
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// One existing A record as reported by the provider
///
/// Snapshots are per-cycle only. The reconciler never mutates them and never
/// keeps them past the cycle that fetched them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned identifier, opaque and unique within the provider
    pub record_id: String,
    /// Host part of the record (`www`, `@`, ...)
    pub rr: String,
    /// Current record value (an IPv4 address for A records)
    pub value: String,
    /// Provider status string (e.g. `ENABLE`)
    pub status: String,
}

impl DnsRecord {
    /// Create a record snapshot
    pub fn new(
        record_id: impl Into<String>,
        rr: impl Into<String>,
        value: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            rr: rr.into(),
            value: value.into(),
            status: status.into(),
        }
    }

    /// Whether the record already points at `ip`
    pub fn points_to(&self, ip: Ipv4Addr) -> bool {
        self.value.trim() == ip.to_string()
    }
}

/// Trait for DNS provider implementations
///
/// Implementations adapt one provider SDK or HTTP API. They translate
/// provider field naming into [`DnsRecord`] and report failures as
/// [`crate::Error`]; classification into fetch/write failures and all
/// decisions about *whether* to write belong to the reconciler.
///
/// # Trust Level: Untrusted
///
/// - Perform API calls to their own endpoint only
/// - No retry, backoff or caching (a failed call waits for the next cycle)
/// - No filtering beyond what the provider API itself does: a keyword search
///   may return sibling hosts and that is expected
/// - Every call must carry a bounded timeout
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the A records the provider returns for a host in a zone
    ///
    /// # Parameters
    ///
    /// - `sub_domain`: Host part (`www`, `@`)
    /// - `main_domain`: Registered domain (`example.com`)
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: Possibly empty, possibly a superset
    /// - `Err(Error)`: If the request failed
    async fn list_records(
        &self,
        sub_domain: &str,
        main_domain: &str,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Create an A record
    ///
    /// # Returns
    ///
    /// The provider-assigned record id
    async fn create_record(
        &self,
        sub_domain: &str,
        main_domain: &str,
        ip: Ipv4Addr,
    ) -> Result<String, crate::Error>;

    /// Point an existing record at a new address
    async fn update_record(
        &self,
        record_id: &str,
        sub_domain: &str,
        ip: Ipv4Addr,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
