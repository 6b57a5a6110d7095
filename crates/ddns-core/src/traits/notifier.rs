// # Notifier Trait
//
// Delivers a one-line message to an external channel when a domain's record
// changes.
//
// ## Implementations
//
// - URL-template webhook: `ddns-notify-webhook` crate
// - [`NoopNotifier`]: used when no target is configured

use async_trait::async_trait;

/// Trait for notification channels
///
/// Delivery is best-effort. Implementations report failure through the
/// returned `Result`; the reconciler logs it and never lets it change a
/// reconciliation outcome.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message
    async fn notify(&self, message: &str) -> Result<(), crate::Error>;

    /// Whether this notifier delivers anywhere at all
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Notifier that drops every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, message: &str) -> Result<(), crate::Error> {
        tracing::trace!("No notification target configured, dropping: {}", message);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
