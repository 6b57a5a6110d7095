// # Webhook Notifier
//
// Delivers change notifications by issuing an HTTP GET to a user-supplied
// URL template. Every `{msg}` placeholder in the template is replaced by the
// message, percent-encoded the way JavaScript's `encodeURIComponent` does,
// so templates such as
//
//   https://api.day.app/<key>/{msg}
//   https://sctapi.ftqq.com/<key>.send?title={msg}
//
// work unchanged.
//
// Delivery is a single attempt; failures are returned to the caller, which
// logs them and moves on.

use async_trait::async_trait;
use ddns_core::traits::{NoopNotifier, Notifier};
use ddns_core::{Error, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Placeholder replaced by the encoded message
pub const PLACEHOLDER: &str = "{msg}";

/// Characters `encodeURIComponent` leaves alone
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Notifier that GETs a URL template
pub struct WebhookNotifier {
    template: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Templates usually embed a push key in the path or query.
        f.debug_struct("WebhookNotifier")
            .field("template", &"<REDACTED>")
            .finish()
    }
}

impl WebhookNotifier {
    /// Create a notifier for `template` with a per-request timeout
    pub fn new(template: impl Into<String>, timeout: Duration) -> Result<Self> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(Error::config("webHook cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { template, client })
    }

    /// URL that would be requested for `message`
    pub fn render(&self, message: &str) -> String {
        render(&self.template, message)
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let url = self.render(message);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::notify(format!("webhook request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::notify(format!("webhook returned HTTP {}", status)));
        }

        debug!("Webhook delivered ({})", status);
        Ok(())
    }
}

/// Replace every `{msg}` in `template` with the encoded message
pub fn render(template: &str, message: &str) -> String {
    let encoded = utf8_percent_encode(message, URI_COMPONENT).to_string();
    template.replace(PLACEHOLDER, &encoded)
}

/// Build the configured notifier, or a no-op when no template is set
pub fn from_config(web_hook: Option<&str>, timeout: Duration) -> Result<Arc<dyn Notifier>> {
    match web_hook.map(str::trim).filter(|t| !t.is_empty()) {
        Some(template) => Ok(Arc::new(WebhookNotifier::new(template, timeout)?)),
        None => Ok(Arc::new(NoopNotifier)),
    }
}
