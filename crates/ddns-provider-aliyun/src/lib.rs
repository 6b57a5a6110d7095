// # Alidns Provider
//
// Alibaba Cloud DNS provider for the DDNS daemon, speaking the signed RPC
// API (version 2015-01-09) over HTTPS GET.
//
// ## Calls
//
// | Operation       | Action                  | Key parameters                              |
// |-----------------|-------------------------|---------------------------------------------|
// | list records    | `DescribeDomainRecords` | `DomainName`, `RRKeyWord`, `TypeKeyWord=A`  |
// | create record   | `AddDomainRecord`       | `DomainName`, `RR`, `Type=A`, `Value`       |
// | update record   | `UpdateDomainRecord`    | `RecordId`, `RR`, `Type=A`, `Value`         |
//
// `RRKeyWord` is a fuzzy match, so listing may return sibling hosts; the
// reconciler filters them out. Each call is a single request with no retry;
// the next cycle is the retry.
//
// ## Security
//
// The AccessKey secret never appears in logs or `Debug` output.

mod signer;

pub use signer::API_VERSION;

use async_trait::async_trait;
use chrono::Utc;
use ddns_core::traits::{DnsProvider, DnsRecord};
use ddns_core::{DdnsConfig, Error, Result};
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info};

const PROVIDER: &str = "aliyun";

/// Page size for `DescribeDomainRecords`
const PAGE_SIZE: &str = "100";

/// Record id returned by create in dry-run mode
pub const DRY_RUN_RECORD_ID: &str = "dry-run";

/// Alidns provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider still lists records but only logs
/// the create/update it would have sent.
pub struct AliyunProvider {
    /// AccessKey ID
    access_key_id: String,

    /// AccessKey secret
    /// ⚠️ NEVER log this value
    access_key_secret: String,

    /// Base URL, e.g. `https://alidns.cn-chengdu.aliyuncs.com/`
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: list for real, log writes instead of sending them
    dry_run: bool,
}

impl std::fmt::Debug for AliyunProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunProvider")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl AliyunProvider {
    /// Create a new provider
    ///
    /// # Parameters
    ///
    /// - `access_key_id` / `access_key_secret`: RAM credentials with Alidns access
    /// - `endpoint`: Host name (HTTPS is assumed) or a full `http(s)://` URL
    /// - `timeout`: Per-request timeout
    /// - `dry_run`: If true, list records but skip writes
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        endpoint: &str,
        timeout: Duration,
        dry_run: bool,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let access_key_secret = access_key_secret.into();

        if access_key_id.trim().is_empty() || access_key_secret.trim().is_empty() {
            return Err(Error::config(
                "Aliyun accessKey and accessKeySecret are required",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            access_key_id,
            access_key_secret,
            base_url: base_url(endpoint)?,
            client,
            dry_run,
        })
    }

    /// Create a provider from daemon configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(
            config.credentials.access_key.clone(),
            config.credentials.access_key_secret.clone(),
            &config.endpoint,
            config.request_timeout(),
            config.dry_run,
        )
    }

    /// Whether writes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Issue one signed RPC call and return the decoded success body
    async fn call<T>(&self, action: &str, args: &[(&str, &str)]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut params = signer::common_params(&self.access_key_id, action, Utc::now());
        for (key, value) in args {
            params.insert((*key).to_string(), (*value).to_string());
        }

        let query = signer::signed_query(&params, &self.access_key_secret)?;
        let url = format!("{}?{}", self.base_url, query);

        debug!("Alidns {} ({} parameter(s))", action, args.len());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::provider(PROVIDER, format!("{} response unreadable: {}", action, e))
        })?;

        if !status.is_success() {
            return Err(api_error(action, status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(
                PROVIDER,
                format!("{} returned an unexpected body: {}", action, e),
            )
        })
    }
}

#[async_trait]
impl DnsProvider for AliyunProvider {
    async fn list_records(&self, sub_domain: &str, main_domain: &str) -> Result<Vec<DnsRecord>> {
        let response: DescribeDomainRecordsResponse = self
            .call(
                "DescribeDomainRecords",
                &[
                    ("DomainName", main_domain),
                    ("RRKeyWord", sub_domain),
                    ("TypeKeyWord", "A"),
                    ("PageSize", PAGE_SIZE),
                ],
            )
            .await?;

        Ok(response
            .domain_records
            .record
            .into_iter()
            .map(|r| DnsRecord::new(r.record_id, r.rr, r.value, r.status))
            .collect())
    }

    async fn create_record(
        &self,
        sub_domain: &str,
        main_domain: &str,
        ip: Ipv4Addr,
    ) -> Result<String> {
        if self.dry_run {
            info!(
                "[DRY-RUN] Would AddDomainRecord {} in {} -> {}",
                sub_domain, main_domain, ip
            );
            return Ok(DRY_RUN_RECORD_ID.to_string());
        }

        let value = ip.to_string();
        let response: RecordIdResponse = self
            .call(
                "AddDomainRecord",
                &[
                    ("DomainName", main_domain),
                    ("RR", sub_domain),
                    ("Type", "A"),
                    ("Value", value.as_str()),
                ],
            )
            .await?;

        Ok(response.record_id)
    }

    async fn update_record(&self, record_id: &str, sub_domain: &str, ip: Ipv4Addr) -> Result<()> {
        if self.dry_run {
            info!(
                "[DRY-RUN] Would UpdateDomainRecord {} ({}) -> {}",
                record_id, sub_domain, ip
            );
            return Ok(());
        }

        let value = ip.to_string();
        let _: RecordIdResponse = self
            .call(
                "UpdateDomainRecord",
                &[
                    ("RecordId", record_id),
                    ("RR", sub_domain),
                    ("Type", "A"),
                    ("Value", value.as_str()),
                ],
            )
            .await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeDomainRecordsResponse {
    #[serde(default)]
    domain_records: DomainRecords,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DomainRecords {
    #[serde(default)]
    record: Vec<WireRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireRecord {
    record_id: String,
    #[serde(rename = "RR")]
    rr: String,
    value: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecordIdResponse {
    record_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Map a non-2xx response onto a provider error
fn api_error(action: &str, status: u16, body: &str) -> Error {
    let detail = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();
    let reason = if detail.code.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("{}: {}", detail.code, detail.message)
    };

    let message = match status {
        401 | 403 => format!(
            "{} authentication failed, check accessKey/accessKeySecret and RAM permissions ({})",
            action, reason
        ),
        429 => format!("{} rate limited, will retry next cycle ({})", action, reason),
        _ if detail.code.starts_with("Throttling") => {
            format!("{} rate limited, will retry next cycle ({})", action, reason)
        }
        500..=599 => format!("{} server error (transient): {}", action, reason),
        _ => format!("{} failed: {}", action, reason),
    };

    Error::provider(PROVIDER, message)
}

/// Turn a configured endpoint into a base URL ending in `/`
fn base_url(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.is_empty() {
        return Err(Error::config("endpoint cannot be empty"));
    }

    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(format!("{}/", endpoint))
    } else {
        Ok(format!("https://{}/", endpoint))
    }
}
