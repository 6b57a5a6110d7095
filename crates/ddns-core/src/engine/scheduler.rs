//! Polling driver
//!
//! The scheduler runs one reconciliation cycle immediately and then one per
//! interval until shutdown. Cycles run inline in the timer loop, so two
//! cycles never overlap; if a cycle outlasts the interval the missed ticks
//! are skipped rather than queued.
//!
//! Each cycle is an error boundary: whatever goes wrong inside it is logged
//! and reported, and the next tick still fires.

use super::reconciler::{DomainReport, Reconciler};
use super::EngineEvent;
use crate::config::{DdnsConfig, ReconcileStrategy};
use crate::error::Result;
use crate::resolver::IpResolver;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Everything one cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u64,
    /// External IP used for this cycle
    pub ip: Ipv4Addr,
    /// One entry per configured domain, in configured order
    pub domains: Vec<DomainReport>,
}

impl CycleReport {
    /// Number of domains whose records were written
    pub fn changed(&self) -> usize {
        self.domains.iter().filter(|d| d.outcome.is_change()).count()
    }

    /// Number of domains that failed
    pub fn failed(&self) -> usize {
        self.domains.iter().filter(|d| d.outcome.is_failure()).count()
    }
}

/// Drives reconciliation cycles on a fixed interval
///
/// ## Lifecycle
///
/// 1. Create with [`Scheduler::new()`]
/// 2. Start with [`Scheduler::run()`]
/// 3. Runs until SIGINT/SIGTERM
pub struct Scheduler {
    /// IP resolver used at the start of every cycle
    resolver: IpResolver,

    /// Per-domain convergence
    reconciler: Reconciler,

    /// Domains to manage, in configured order
    domains: Vec<String>,

    /// Time between cycle starts
    interval: Duration,

    /// Domain walk strategy
    strategy: ReconcileStrategy,

    /// Cycles started so far
    cycles: AtomicU64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields engine events
    pub fn new(
        resolver: IpResolver,
        reconciler: Reconciler,
        config: &DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let scheduler = Self {
            resolver,
            reconciler,
            domains: config.domains.clone(),
            interval: config.interval(),
            strategy: config.reconcile_strategy,
            cycles: AtomicU64::new(0),
            event_tx: tx,
        };

        Ok((scheduler, rx))
    }

    /// Run until SIGINT/SIGTERM
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// Used by tests and by embedders that manage their own signals.
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_internal(Some(shutdown_rx)).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        info!(
            "Scheduler started: {} domain(s), {}s interval, strategy {:?}",
            self.domains.len(),
            self.interval.as_secs(),
            self.strategy
        );
        self.emit_event(EngineEvent::Started {
            domains_count: self.domains.len(),
        });

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                    "Shutdown signal"
                }
                None => wait_for_signal().await,
            }
        };
        tokio::pin!(shutdown);

        // First tick completes immediately: startup cycle.
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                reason = &mut shutdown => {
                    info!("{} received, stopping scheduler", reason);
                    self.emit_event(EngineEvent::Stopped {
                        reason: reason.to_string(),
                    });
                    break;
                }

                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        Ok(())
    }

    /// Run one cycle and absorb its failure
    async fn tick(&self) {
        match self.run_cycle().await {
            Ok(report) => {
                info!(
                    "Cycle {} complete: {} domain(s), {} changed, {} failed",
                    report.cycle,
                    report.domains.len(),
                    report.changed(),
                    report.failed()
                );
            }
            Err(e) => {
                error!("Cycle aborted, waiting for next tick: {}", e);
            }
        }
    }

    /// Resolve the external IP and reconcile every configured domain once
    ///
    /// # Returns
    ///
    /// - `Ok(CycleReport)`: Per-domain outcomes (which may include failures)
    /// - `Err(Error::Resolution)`: No IP source succeeded; nothing was written
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        self.emit_event(EngineEvent::CycleStarted { cycle });

        let ip = match self.resolver.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                self.emit_event(EngineEvent::ResolutionFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        info!("Current external IP: {}", ip);
        self.emit_event(EngineEvent::IpResolved { ip });

        let domains = self
            .reconciler
            .reconcile_all(&self.domains, ip, self.strategy)
            .await;

        for report in &domains {
            info!("{}: {}", report.domain, report.outcome);
            self.emit_event(EngineEvent::DomainReconciled {
                domain: report.domain.clone(),
                outcome: report.outcome.clone(),
            });
        }

        self.emit_event(EngineEvent::CycleCompleted { cycle });

        Ok(CycleReport { cycle, ip, domains })
    }

    /// Number of cycles started so far
    pub fn cycles_started(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // A slow or absent consumer must never stall a cycle.
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event");
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            }
        }
        _ => {
            warn!("Failed to install signal handlers, falling back to Ctrl-C");
            ctrl_c().await
        }
    }
}

/// Wait for Ctrl-C
#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
