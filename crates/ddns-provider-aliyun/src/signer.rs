//! Alidns RPC request signing
//!
//! Every request carries the common parameters plus the action's own, all
//! sorted by name and RFC 3986 encoded into a canonical query. The signature
//! is `Base64(HMAC-SHA1(secret + "&", "GET&%2F&" + encode(canonical)))`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use ddns_core::{Error, Result};

/// API version of the Alidns RPC endpoint
pub const API_VERSION: &str = "2015-01-09";

/// Everything except RFC 3986 unreserved characters
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

static NONCE_COUNTER: AtomicU64 = AtomicU64::new(0);

type HmacSha1 = Hmac<Sha1>;

/// Percent-encode per RFC 3986 (space becomes `%20`, `~` stays literal)
pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, RFC3986).to_string()
}

/// Common parameters for one call
pub fn common_params(
    access_key_id: &str,
    action: &str,
    now: DateTime<Utc>,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("Format".to_string(), "JSON".to_string());
    params.insert("Version".to_string(), API_VERSION.to_string());
    params.insert("AccessKeyId".to_string(), access_key_id.to_string());
    params.insert("SignatureMethod".to_string(), "HMAC-SHA1".to_string());
    params.insert("SignatureVersion".to_string(), "1.0".to_string());
    params.insert("SignatureNonce".to_string(), nonce(now));
    params.insert(
        "Timestamp".to_string(),
        now.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    );
    params.insert("Action".to_string(), action.to_string());
    params
}

/// Canonical query: sorted `key=value` pairs, both sides encoded
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(canonical: &str) -> String {
    format!("GET&{}&{}", encode("/"), encode(canonical))
}

/// Sign `params` and return the full query string, `Signature` included
pub fn signed_query(params: &BTreeMap<String, String>, access_key_secret: &str) -> Result<String> {
    let canonical = canonical_query(params);
    let signature = sign(access_key_secret, &string_to_sign(&canonical))?;
    Ok(format!("{}&Signature={}", canonical, encode(&signature)))
}

/// Base64(HMAC-SHA1(secret + "&", text))
pub fn sign(access_key_secret: &str, text: &str) -> Result<String> {
    let key = format!("{}&", access_key_secret);
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| Error::provider("aliyun", format!("Invalid signing key: {}", e)))?;
    mac.update(text.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn nonce(now: DateTime<Utc>) -> String {
    let seq = NONCE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{}-{}",
        now.timestamp_nanos_opt().unwrap_or_default(),
        std::process::id(),
        seq
    )
}
