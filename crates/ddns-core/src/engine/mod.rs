//! Core DDNS engine
//!
//! The engine is responsible for:
//! - Resolving the current external IP once per cycle
//! - Diffing each domain's records against that IP
//! - Issuing the minimal set of provider writes
//! - Notifying once per changed domain
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   tick    ┌──────────────┐
//! │  Scheduler  │──────────▶│  IpResolver  │── IpSource, IpSource, ...
//! └─────────────┘           └──────────────┘
//!        │ ip
//!        ▼
//! ┌──────────────┐   list / create / update   ┌─────────────┐
//! │  Reconciler  │───────────────────────────▶│ DnsProvider │
//! └──────────────┘                            └─────────────┘
//!        │ on change
//!        ▼
//! ┌─────────────┐
//! │  Notifier   │
//! └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Timer fires (immediately on start, then every interval)
//! 2. Resolve external IP; abort the cycle if every source fails
//! 3. For each domain in order: fetch, filter, create/update, notify
//! 4. Emit events for monitoring/logging

mod reconciler;
mod scheduler;

pub use reconciler::{change_message, DomainReport, ReconcileOutcome, Reconciler};
pub use scheduler::{CycleReport, Scheduler};

use std::net::Ipv4Addr;

/// Events emitted by the Scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Scheduler started
    Started {
        domains_count: usize,
    },

    /// A cycle began
    CycleStarted {
        cycle: u64,
    },

    /// External IP resolved for the current cycle
    IpResolved {
        ip: Ipv4Addr,
    },

    /// Every IP source failed; the cycle was aborted
    ResolutionFailed {
        error: String,
    },

    /// One domain finished reconciling
    DomainReconciled {
        domain: String,
        outcome: ReconcileOutcome,
    },

    /// A cycle finished (not emitted for aborted cycles)
    CycleCompleted {
        cycle: u64,
    },

    /// Scheduler stopped
    Stopped {
        reason: String,
    },
}
