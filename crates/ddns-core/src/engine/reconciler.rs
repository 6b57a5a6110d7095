//! Per-domain convergence
//!
//! For one domain the reconciler fetches the provider's records, keeps only
//! those whose host part matches exactly, and then:
//!
//! | records found            | writes                    | outcome     |
//! |--------------------------|---------------------------|-------------|
//! | none                     | one create                | `Created`   |
//! | all point at the IP      | none                      | `Unchanged` |
//! | some are stale           | one update per stale one  | `Updated`   |
//!
//! A change produces exactly one notification after all writes for that
//! domain have finished. Provider errors never escape: they become a
//! `Failed` outcome and the next domain proceeds.

use crate::config::ReconcileStrategy;
use crate::domain::DomainSpec;
use crate::error::Error;
use crate::traits::{DnsProvider, DnsRecord, Notifier};
use futures::future::join_all;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of reconciling one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No record existed; one was created
    Created {
        /// Id assigned by the provider
        record_id: String,
    },

    /// At least one stale record was rewritten
    Updated {
        /// Stale records successfully updated
        updated: usize,
        /// Stale records whose update failed
        failed: usize,
    },

    /// Every matching record already pointed at the IP
    Unchanged,

    /// Nothing was written: fetch failed, create failed, or every update failed
    Failed(String),

    /// Not examined this cycle (first-domain strategy)
    Skipped,
}

impl ReconcileOutcome {
    /// Whether the provider's state was changed
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Updated { .. })
    }

    /// Whether this outcome represents a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { record_id } => write!(f, "created (record {})", record_id),
            Self::Updated { updated, failed: 0 } => write!(f, "updated {} record(s)", updated),
            Self::Updated { updated, failed } => {
                write!(f, "updated {} record(s), {} failed", updated, failed)
            }
            Self::Unchanged => write!(f, "unchanged"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Outcome for one configured domain within a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    /// Domain as configured
    pub domain: String,
    /// What happened to it
    pub outcome: ReconcileOutcome,
}

/// Converges DNS records for configured domains to a desired IP
pub struct Reconciler {
    provider: Arc<dyn DnsProvider>,
    notifier: Arc<dyn Notifier>,
}

impl Reconciler {
    /// Create a reconciler
    ///
    /// # Parameters
    ///
    /// - `provider`: DNS provider implementation
    /// - `notifier`: Notification channel (use `NoopNotifier` for none)
    pub fn new(provider: Arc<dyn DnsProvider>, notifier: Arc<dyn Notifier>) -> Self {
        Self { provider, notifier }
    }

    /// Reconcile every domain in configured order
    ///
    /// With [`ReconcileStrategy::FirstDomain`], the first domain is probed and
    /// the rest are reported as `Skipped` when it came back `Unchanged`.
    pub async fn reconcile_all(
        &self,
        domains: &[String],
        ip: Ipv4Addr,
        strategy: ReconcileStrategy,
    ) -> Vec<DomainReport> {
        let mut reports = Vec::with_capacity(domains.len());
        let mut domains_iter = domains.iter();

        if strategy == ReconcileStrategy::FirstDomain
            && let Some(first) = domains_iter.next()
        {
            let outcome = self.reconcile_one(first, ip).await;
            let skip_rest = outcome == ReconcileOutcome::Unchanged;
            reports.push(DomainReport {
                domain: first.clone(),
                outcome,
            });

            if skip_rest {
                debug!(
                    "{} unchanged, skipping {} remaining domain(s) this cycle",
                    first,
                    domains.len() - 1
                );
                reports.extend(domains_iter.map(|domain| DomainReport {
                    domain: domain.clone(),
                    outcome: ReconcileOutcome::Skipped,
                }));
                return reports;
            }
        }

        for domain in domains_iter {
            let outcome = self.reconcile_one(domain, ip).await;
            reports.push(DomainReport {
                domain: domain.clone(),
                outcome,
            });
        }

        reports
    }

    /// Converge one domain's A records to `ip`
    pub async fn reconcile_one(&self, domain: &str, ip: Ipv4Addr) -> ReconcileOutcome {
        let spec = DomainSpec::parse(domain);

        let records = match self
            .provider
            .list_records(&spec.sub_domain, &spec.main_domain)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                let err = Error::provider_fetch(domain, &e);
                warn!("{}", err);
                return ReconcileOutcome::Failed(err.to_string());
            }
        };

        // Keyword search may return siblings such as `www2` for `www`.
        let matching: Vec<DnsRecord> = records
            .into_iter()
            .filter(|record| record.rr == spec.sub_domain)
            .collect();

        if matching.is_empty() {
            return self.create(domain, &spec, ip).await;
        }

        let stale: Vec<&DnsRecord> = matching.iter().filter(|r| !r.points_to(ip)).collect();
        if stale.is_empty() {
            debug!("{} already points to {}", domain, ip);
            return ReconcileOutcome::Unchanged;
        }

        self.update(domain, &spec, &stale, ip).await
    }

    async fn create(&self, domain: &str, spec: &DomainSpec, ip: Ipv4Addr) -> ReconcileOutcome {
        info!("{} has no A record, creating one for {}", domain, ip);

        match self
            .provider
            .create_record(&spec.sub_domain, &spec.main_domain, ip)
            .await
        {
            Ok(record_id) => {
                self.notify_change(domain, ip).await;
                ReconcileOutcome::Created { record_id }
            }
            Err(e) => {
                let err = Error::provider_write(domain, &e);
                warn!("{}", err);
                ReconcileOutcome::Failed(err.to_string())
            }
        }
    }

    async fn update(
        &self,
        domain: &str,
        spec: &DomainSpec,
        stale: &[&DnsRecord],
        ip: Ipv4Addr,
    ) -> ReconcileOutcome {
        info!(
            "{} has {} stale record(s), updating to {}",
            domain,
            stale.len(),
            ip
        );

        // Updates are independent; one failing must not stop the others.
        let results = join_all(stale.iter().map(|record| async move {
            let result = self
                .provider
                .update_record(&record.record_id, &spec.sub_domain, ip)
                .await;
            (*record, result)
        }))
        .await;

        let mut updated = 0;
        let mut failures = Vec::new();
        for (record, result) in results {
            match result {
                Ok(()) => {
                    debug!("Record {} for {}: {} -> {}", record.record_id, domain, record.value, ip);
                    updated += 1;
                }
                Err(e) => {
                    let err = Error::provider_write(domain, &e);
                    warn!("Record {}: {}", record.record_id, err);
                    failures.push(err.to_string());
                }
            }
        }

        if updated == 0 {
            return ReconcileOutcome::Failed(failures.join("; "));
        }

        self.notify_change(domain, ip).await;
        ReconcileOutcome::Updated {
            updated,
            failed: failures.len(),
        }
    }

    async fn notify_change(&self, domain: &str, ip: Ipv4Addr) {
        if !self.notifier.is_enabled() {
            return;
        }

        let message = change_message(domain, ip);
        if let Err(e) = self.notifier.notify(&message).await {
            warn!("Notification for {} not delivered: {}", domain, e);
        }
    }
}

/// Human-readable notification text for a converged domain
pub fn change_message(domain: &str, ip: Ipv4Addr) -> String {
    format!("Domain {} now resolves to {}", domain, ip)
}
