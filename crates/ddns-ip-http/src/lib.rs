// # HTTP IP Sources
//
// This crate asks public "what is my IP" services for the machine's
// external IPv4 address.
//
// ## Usage
//
// Each [`HttpIpSource`] wraps one service URL and knows how to read its
// response body (plain text or a JSON field). [`default_sources`] returns
// the built-in list in priority order, ready to hand to
// `ddns_core::IpResolver`.
//
// ## IPv4 only
//
// Managed records are A records, so an IPv6 answer (or anything that is not
// a dotted IPv4 address) counts as a failure of that source and the
// resolver moves on to the next one.

use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

use tracing::debug;

/// Default request timeout when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Built-in services in priority order
pub const DEFAULT_SOURCES: &[(&str, ResponseKind)] = &[
    ("https://jsonip.com", ResponseKind::JsonIp),
    ("https://api.ipify.org?format=json", ResponseKind::JsonIp),
    ("https://ipv4.icanhazip.com", ResponseKind::PlainText),
    ("https://checkip.amazonaws.com", ResponseKind::PlainText),
    ("https://ipv4.ident.me", ResponseKind::PlainText),
];

/// Shape of a built-in service's response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Body is the address, possibly surrounded by whitespace
    PlainText,
    /// Body is a JSON object with the address under `"ip"`
    JsonIp,
}

/// How to pull the address out of a response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Body is the address, possibly surrounded by whitespace
    PlainText,
    /// Body is a JSON object; the address is the string under this key
    JsonField(String),
}

impl From<ResponseKind> for ResponseFormat {
    fn from(kind: ResponseKind) -> Self {
        match kind {
            ResponseKind::PlainText => Self::PlainText,
            ResponseKind::JsonIp => Self::JsonField("ip".to_string()),
        }
    }
}

impl ResponseFormat {
    /// Extract an IPv4 address from a response body
    pub fn parse(&self, body: &str) -> Result<Ipv4Addr> {
        let text = match self {
            Self::PlainText => body.trim().to_string(),
            Self::JsonField(field) => {
                let value: serde_json::Value = serde_json::from_str(body)?;
                value
                    .get(field)
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| {
                        Error::ip_source(format!("response has no string field '{}'", field))
                    })?
            }
        };

        text.parse::<Ipv4Addr>()
            .map_err(|_| Error::ip_source(format!("not an IPv4 address: {:?}", truncate(&text))))
    }
}

/// One external IP service reached over HTTP(S)
pub struct HttpIpSource {
    /// URL to fetch
    url: String,

    /// Body format
    format: ResponseFormat,

    /// HTTP client (carries the request timeout)
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source with the default timeout
    pub fn new(url: impl Into<String>, format: ResponseFormat) -> Result<Self> {
        Self::with_timeout(url, format, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a source whose requests give up after `timeout`
    pub fn with_timeout(
        url: impl Into<String>,
        format: ResponseFormat,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            format,
            client,
        })
    }

    /// URL this source queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn fetch(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ip_source(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("failed to read response: {}", e)))?;

        let ip = self.format.parse(&body)?;
        debug!("{} reported {}", self.url, ip);
        Ok(ip)
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Build the built-in sources, highest priority first
pub fn default_sources(timeout: Duration) -> Result<Vec<Box<dyn IpSource>>> {
    DEFAULT_SOURCES
        .iter()
        .map(|(url, kind)| {
            HttpIpSource::with_timeout(*url, (*kind).into(), timeout)
                .map(|source| Box::new(source) as Box<dyn IpSource>)
        })
        .collect()
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(64) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
