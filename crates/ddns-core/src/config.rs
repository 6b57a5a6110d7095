//! Configuration types for the DDNS system
//!
//! Configuration is loaded once at startup, validated, and then passed by
//! value to the components that need it. Nothing reads the environment after
//! that point.
//!
//! Two sources share the same key names:
//!
//! - the process environment ([`DdnsConfig::from_env`])
//! - a JSON document ([`DdnsConfig::from_json_file`])
//!
//! ```json
//! {
//!   "accessKey": "LTAI...",
//!   "accessKeySecret": "...",
//!   "domain": "example.com, www.example.com",
//!   "interval": 300,
//!   "webHook": "https://push.example.net/send?text={msg}"
//! }
//! ```

use crate::domain::validate_domain_name;
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Recognized configuration keys
pub mod keys {
    pub const ACCESS_KEY: &str = "accessKey";
    pub const ACCESS_KEY_SECRET: &str = "accessKeySecret";
    pub const DOMAIN: &str = "domain";
    pub const INTERVAL: &str = "interval";
    pub const WEB_HOOK: &str = "webHook";
    pub const RECONCILE_MODE: &str = "reconcileMode";
    pub const TIMEOUT: &str = "timeout";
    pub const ENDPOINT: &str = "endpoint";
    pub const DRY_RUN: &str = "dryRun";
    pub const LOG_LEVEL: &str = "logLevel";
}

/// Default poll interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default timeout for every outbound request in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default Alibaba Cloud DNS API endpoint
pub const DEFAULT_ENDPOINT: &str = "alidns.cn-chengdu.aliyuncs.com";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Provider credentials
///
/// The Debug implementation intentionally does NOT expose the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id
    pub access_key: String,
    /// Access key secret
    /// ⚠️ NEVER log this value
    pub access_key_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("access_key_secret", &"<REDACTED>")
            .finish()
    }
}

/// How a cycle walks the configured domains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcileStrategy {
    /// Reconcile every domain independently
    #[default]
    All,

    /// Reconcile the first domain; skip the rest for this cycle if it was
    /// already correct
    ///
    /// This is a heuristic, not a guarantee. It is only sound when every
    /// configured domain is always updated together (same IP, same cadence).
    /// A domain edited out-of-band while the first stays correct will not be
    /// repaired until the first domain also changes.
    FirstDomain,
}

impl std::str::FromStr for ReconcileStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "first-domain" | "first_domain" | "firstdomain" => Ok(Self::FirstDomain),
            other => Err(Error::config(format!(
                "{} '{}' is not supported. Supported modes: all, first-domain",
                keys::RECONCILE_MODE,
                other
            ))),
        }
    }
}

/// Main DDNS configuration
#[derive(Debug, Clone)]
pub struct DdnsConfig {
    /// Provider credentials
    pub credentials: Credentials,

    /// Fully-qualified domains to manage, in configured order
    pub domains: Vec<String>,

    /// Seconds between reconciliation cycles
    pub interval_secs: u64,

    /// Notification URL template containing `{msg}`
    pub web_hook: Option<String>,

    /// Domain walk strategy
    pub reconcile_strategy: ReconcileStrategy,

    /// Timeout applied to every outbound request
    pub request_timeout_secs: u64,

    /// Provider API endpoint host
    pub endpoint: String,

    /// Log provider writes instead of performing them
    pub dry_run: bool,

    /// Log level for the daemon
    pub log_level: String,

    /// Capacity of the engine event channel
    pub event_channel_capacity: usize,

    /// Values that were reinterpreted or replaced by a default while loading.
    /// Loading usually happens before logging is set up, so the caller
    /// reports these.
    pub notices: Vec<String>,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but the required keys
    pub fn new(
        access_key: impl Into<String>,
        access_key_secret: impl Into<String>,
        domains: Vec<String>,
    ) -> Self {
        Self {
            credentials: Credentials {
                access_key: access_key.into(),
                access_key_secret: access_key_secret.into(),
            },
            domains,
            interval_secs: DEFAULT_INTERVAL_SECS,
            web_hook: None,
            reconcile_strategy: ReconcileStrategy::All,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            dry_run: false,
            log_level: "info".to_string(),
            event_channel_capacity: default_event_channel_capacity(),
            notices: Vec::new(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = RawConfig {
            access_key: lookup(keys::ACCESS_KEY),
            access_key_secret: lookup(keys::ACCESS_KEY_SECRET),
            domain: lookup(keys::DOMAIN).map(Value::String),
            interval: lookup(keys::INTERVAL).map(Value::String),
            web_hook: lookup(keys::WEB_HOOK),
            reconcile_mode: lookup(keys::RECONCILE_MODE),
            timeout: lookup(keys::TIMEOUT).map(Value::String),
            endpoint: lookup(keys::ENDPOINT),
            dry_run: lookup(keys::DRY_RUN).map(Value::String),
            log_level: lookup(keys::LOG_LEVEL),
        };

        raw.into_config()
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        Self::from_json_str(&content)
            .map_err(|e| Error::config(format!("{} ({})", strip_prefix(&e), path.display())))
    }

    /// Load configuration from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config JSON: {}", e)))?;

        raw.into_config()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.credentials.access_key.trim().is_empty() {
            return Err(Error::config(format!("{} is required", keys::ACCESS_KEY)));
        }

        if self.credentials.access_key_secret.trim().is_empty() {
            return Err(Error::config(format!(
                "{} is required",
                keys::ACCESS_KEY_SECRET
            )));
        }

        if self.domains.is_empty() {
            return Err(Error::config(format!(
                "{} must contain at least one domain, e.g. {}=example.com,www.example.com",
                keys::DOMAIN,
                keys::DOMAIN
            )));
        }

        for domain in &self.domains {
            validate_domain_name(domain)
                .map_err(|e| Error::config(format!("Invalid {} entry: {}", keys::DOMAIN, e)))?;
        }

        if self.interval_secs == 0 {
            return Err(Error::config(format!("{} must be > 0", keys::INTERVAL)));
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::config(format!("{} must be > 0", keys::TIMEOUT)));
        }

        if self.endpoint.trim().is_empty() {
            return Err(Error::config(format!("{} cannot be empty", keys::ENDPOINT)));
        }

        if let Some(ref hook) = self.web_hook
            && !hook.starts_with("https://")
            && !hook.starts_with("http://")
        {
            return Err(Error::config(format!(
                "{} must use HTTP or HTTPS scheme. Got: {}",
                keys::WEB_HOOK,
                hook
            )));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(Error::config(format!(
                "{} '{}' is not valid. Valid levels: {}",
                keys::LOG_LEVEL,
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        if self.event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }

    /// Poll interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Unvalidated configuration as it appears in a file or the environment
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    access_key: Option<String>,
    access_key_secret: Option<String>,
    domain: Option<Value>,
    interval: Option<Value>,
    web_hook: Option<String>,
    reconcile_mode: Option<String>,
    timeout: Option<Value>,
    endpoint: Option<String>,
    dry_run: Option<Value>,
    log_level: Option<String>,
}

impl RawConfig {
    fn into_config(self) -> Result<DdnsConfig> {
        let access_key = non_empty(self.access_key)
            .ok_or_else(|| Error::config(format!("{} is required", keys::ACCESS_KEY)))?;
        let access_key_secret = non_empty(self.access_key_secret)
            .ok_or_else(|| Error::config(format!("{} is required", keys::ACCESS_KEY_SECRET)))?;

        let domains = match self.domain {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(scalar_to_string)
                .flat_map(|s| split_domains(&s))
                .collect(),
            Some(other) => scalar_to_string(&other)
                .map(|s| split_domains(&s))
                .unwrap_or_default(),
            None => Vec::new(),
        };

        let mut config = DdnsConfig::new(access_key, access_key_secret, domains);

        config.interval_secs = lenient_secs(
            self.interval.as_ref(),
            keys::INTERVAL,
            DEFAULT_INTERVAL_SECS,
            &mut config.notices,
        );
        config.request_timeout_secs = lenient_secs(
            self.timeout.as_ref(),
            keys::TIMEOUT,
            DEFAULT_REQUEST_TIMEOUT_SECS,
            &mut config.notices,
        );
        config.web_hook = non_empty(self.web_hook);

        if let Some(mode) = non_empty(self.reconcile_mode) {
            config.reconcile_strategy = mode.parse()?;
        }

        if let Some(endpoint) = non_empty(self.endpoint) {
            config.endpoint = endpoint;
        }

        config.dry_run = self
            .dry_run
            .as_ref()
            .and_then(scalar_to_string)
            .map(|s| matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        if let Some(level) = non_empty(self.log_level) {
            config.log_level = level.to_lowercase();
        }

        config.validate()?;
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn split_domains(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Seconds from the leading digits of `value` ("30s" is 30, 1.5 is 1).
///
/// Blank or absent values give `default` silently; anything without a
/// positive leading number gives `default` and records a notice.
fn lenient_secs(
    value: Option<&Value>,
    key: &str,
    default: u64,
    notices: &mut Vec<String>,
) -> u64 {
    let Some(raw) = value.and_then(scalar_to_string) else {
        return default;
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return default;
    }

    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    match unsigned[..end].parse::<u64>() {
        Ok(secs) if secs > 0 => {
            if end < unsigned.len() {
                notices.push(format!("Reading {} '{}' as {}", key, raw, secs));
            }
            secs
        }
        _ => {
            notices.push(format!("Ignoring invalid {} '{}', using {}", key, raw, default));
            default
        }
    }
}

fn strip_prefix(err: &Error) -> String {
    match err {
        Error::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}

fn default_event_channel_capacity() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_required_keys_with_defaults() {
        let config = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
            ("domain", "example.com, www.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.domains, vec!["example.com", "www.example.com"]);
        assert_eq!(config.interval_secs, 300);
        assert_eq!(config.web_hook, None);
        assert_eq!(config.reconcile_strategy, ReconcileStrategy::All);
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(!config.dry_run);
    }

    #[test]
    fn missing_required_keys_fail() {
        let err = DdnsConfig::from_lookup(lookup(&[
            ("accessKeySecret", "secret"),
            ("domain", "example.com"),
        ]))
        .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("accessKey"));

        let err = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("domain"));

        let err = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "  "),
            ("domain", "example.com"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("accessKeySecret"));
    }

    #[test]
    fn domain_list_of_only_commas_is_rejected() {
        let err = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
            ("domain", " , ,"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("at least one domain"));
    }

    #[test]
    fn single_label_domain_is_rejected() {
        let err = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
            ("domain", "example.com,localhost"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("localhost"));
    }

    #[test]
    fn invalid_interval_falls_back_to_default() {
        for bad in ["abc", "0", "-5", ""] {
            let config = DdnsConfig::from_lookup(lookup(&[
                ("accessKey", "id"),
                ("accessKeySecret", "secret"),
                ("domain", "example.com"),
                ("interval", bad),
            ]))
            .unwrap();
            assert_eq!(config.interval_secs, 300, "interval {:?}", bad);
        }
    }

    #[test]
    fn invalid_interval_is_reported_as_a_notice() {
        let config = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
            ("domain", "example.com"),
            ("interval", "abc"),
            ("timeout", "-1"),
        ]))
        .unwrap();

        assert_eq!(config.interval_secs, 300);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.notices.len(), 2, "{:?}", config.notices);
        assert!(config.notices[0].contains("interval") && config.notices[0].contains("abc"));
        assert!(config.notices[1].contains("timeout"));
    }

    #[test]
    fn absent_or_valid_values_leave_no_notices() {
        let config = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
            ("domain", "example.com"),
            ("interval", "60"),
        ]))
        .unwrap();
        assert!(config.notices.is_empty(), "{:?}", config.notices);

        let config = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
            ("domain", "example.com"),
            ("interval", ""),
        ]))
        .unwrap();
        assert_eq!(config.interval_secs, 300);
        assert!(config.notices.is_empty(), "{:?}", config.notices);
    }

    #[test]
    fn interval_uses_leading_digits() {
        for (raw, secs) in [("30s", 30), ("+45", 45), (" 90 ", 90), ("1.5", 1)] {
            let config = DdnsConfig::from_lookup(lookup(&[
                ("accessKey", "id"),
                ("accessKeySecret", "secret"),
                ("domain", "example.com"),
                ("interval", raw),
            ]))
            .unwrap();
            assert_eq!(config.interval_secs, secs, "interval {:?}", raw);
        }
    }

    #[test]
    fn fractional_json_interval_is_truncated_with_a_notice() {
        let config = DdnsConfig::from_json_str(
            r#"{"accessKey": "id", "accessKeySecret": "secret", "domain": "example.com", "interval": 1.5}"#,
        )
        .unwrap();

        assert_eq!(config.interval_secs, 1);
        assert_eq!(config.notices, vec!["Reading interval '1.5' as 1".to_string()]);
    }

    #[test]
    fn optional_keys_are_read() {
        let config = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
            ("domain", "example.com"),
            ("interval", "60"),
            ("webHook", "https://hook.example.net/send?text={msg}"),
            ("reconcileMode", "first-domain"),
            ("timeout", "5"),
            ("endpoint", "alidns.cn-hangzhou.aliyuncs.com"),
            ("dryRun", "true"),
            ("logLevel", "DEBUG"),
        ]))
        .unwrap();

        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.web_hook.as_deref(),
            Some("https://hook.example.net/send?text={msg}")
        );
        assert_eq!(config.reconcile_strategy, ReconcileStrategy::FirstDomain);
        assert_eq!(config.endpoint, "alidns.cn-hangzhou.aliyuncs.com");
        assert!(config.dry_run);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn unknown_reconcile_mode_is_rejected() {
        let err = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
            ("domain", "example.com"),
            ("reconcileMode", "sometimes"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("reconcileMode"));
    }

    #[test]
    fn web_hook_must_be_http() {
        let err = DdnsConfig::from_lookup(lookup(&[
            ("accessKey", "id"),
            ("accessKeySecret", "secret"),
            ("domain", "example.com"),
            ("webHook", "ftp://hook.example.net/{msg}"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("webHook"));
    }

    #[test]
    fn loads_json_document() {
        let config = DdnsConfig::from_json_str(
            r#"{
                "accessKey": "id",
                "accessKeySecret": "secret",
                "domain": "example.com,home.example.com",
                "interval": 120,
                "webHook": "https://hook.example.net/?m={msg}"
            }"#,
        )
        .unwrap();

        assert_eq!(config.domains.len(), 2);
        assert_eq!(config.interval_secs, 120);
        assert!(config.web_hook.is_some());
    }

    #[test]
    fn json_accepts_domain_array_and_string_interval() {
        let config = DdnsConfig::from_json_str(
            r#"{
                "accessKey": "id",
                "accessKeySecret": "secret",
                "domain": ["example.com", "a.example.com"],
                "interval": "30",
                "dryRun": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.domains, vec!["example.com", "a.example.com"]);
        assert_eq!(config.interval_secs, 30);
        assert!(config.dry_run);
    }

    #[test]
    fn loads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"accessKey":"id","accessKeySecret":"secret","domain":"example.com"}"#,
        )
        .unwrap();

        let config = DdnsConfig::from_json_file(&path).unwrap();
        assert_eq!(config.domains, vec!["example.com"]);
    }

    #[test]
    fn missing_json_file_is_a_config_error() {
        let err = DdnsConfig::from_json_file("/nonexistent/ddns/config.json").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn secret_not_exposed_in_debug() {
        let config = DdnsConfig::new("id", "super-secret-value", vec!["example.com".into()]);
        let debug_str = format!("{:?}", config);
        assert!(!debug_str.contains("super-secret-value"));
        assert!(debug_str.contains("<REDACTED>"));
    }
}
