// # ddns-core
//
// Core library for the polling DDNS daemon.
//
// ## Architecture Overview
//
// This library keeps A records pointed at the machine's public IPv4 address:
// - **IpSource**: Trait for asking one external service for the public IP
// - **IpResolver**: Ordered sources with first-success short-circuit
// - **DnsProvider**: Trait for listing, creating and updating A records
// - **Notifier**: Trait for best-effort change notifications
// - **Reconciler**: Diffs one domain's records against the IP and converges
// - **Scheduler**: Runs a cycle on startup and then on a fixed interval
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider/HTTP implementations
// 2. **Idempotency**: Re-running a cycle with an unchanged IP writes nothing
// 3. **Failure Isolation**: call → record → domain → cycle; only configuration errors are fatal
// 4. **Library-First**: All core functionality can be used as a library

pub mod traits;
pub mod engine;
pub mod resolver;
pub mod domain;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DnsRecord, Notifier, NoopNotifier};
pub use engine::{
    CycleReport, DomainReport, EngineEvent, ReconcileOutcome, Reconciler, Scheduler,
};
pub use resolver::IpResolver;
pub use domain::DomainSpec;
pub use config::{Credentials, DdnsConfig, ReconcileStrategy};
pub use error::{Error, Result, SourceFailure};
