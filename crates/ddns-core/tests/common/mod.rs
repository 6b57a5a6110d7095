//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles record every call so tests can assert on exactly which
//! provider writes and notifications a cycle produced.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource, Notifier};
use ddns_core::{DdnsConfig, IpResolver, Reconciler};
use std::collections::{HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An update call as seen by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub record_id: String,
    pub sub_domain: String,
    pub ip: Ipv4Addr,
}

/// An in-memory DnsProvider that tracks calls
///
/// `list_records` matches by prefix, like a provider keyword search, so it
/// deliberately returns sibling hosts too.
#[derive(Default)]
pub struct MockDnsProvider {
    records: Mutex<Vec<(String, DnsRecord)>>,
    next_id: AtomicUsize,
    list_call_count: AtomicUsize,
    create_calls: Mutex<Vec<(String, String, Ipv4Addr)>>,
    update_calls: Mutex<Vec<UpdateCall>>,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    failing_updates: Mutex<HashSet<String>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1000),
            ..Default::default()
        }
    }

    /// Seed an existing record in `main_domain`
    pub fn with_record(self, main_domain: &str, record_id: &str, rr: &str, value: &str) -> Self {
        self.records.lock().unwrap().push((
            main_domain.to_string(),
            DnsRecord::new(record_id, rr, value, "ENABLE"),
        ));
        self
    }

    /// Make every list call fail
    pub fn failing_list(self) -> Self {
        self.fail_list.store(true, Ordering::SeqCst);
        self
    }

    /// Make every create call fail
    pub fn failing_create(self) -> Self {
        self.fail_create.store(true, Ordering::SeqCst);
        self
    }

    /// Make updates of one record id fail
    pub fn failing_update(self, record_id: &str) -> Self {
        self.failing_updates
            .lock()
            .unwrap()
            .insert(record_id.to_string());
        self
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> Vec<(String, String, Ipv4Addr)> {
        self.create_calls.lock().unwrap().clone()
    }

    pub fn update_calls(&self) -> Vec<UpdateCall> {
        self.update_calls.lock().unwrap().clone()
    }

    /// Number of create + update calls (successful or not)
    pub fn write_count(&self) -> usize {
        self.create_calls.lock().unwrap().len() + self.update_calls.lock().unwrap().len()
    }

    /// Current value of a record by id
    pub fn value_of(&self, record_id: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|(_, r)| r.record_id == record_id)
            .map(|(_, r)| r.value.clone())
    }

    /// All records stored for an exact host
    pub fn records_for(&self, sub_domain: &str, main_domain: &str) -> Vec<DnsRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(zone, r)| zone == main_domain && r.rr == sub_domain)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, sub_domain: &str, main_domain: &str) -> Result<Vec<DnsRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "ServiceUnavailable"));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(zone, r)| zone == main_domain && r.rr.starts_with(sub_domain))
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_record(
        &self,
        sub_domain: &str,
        main_domain: &str,
        ip: Ipv4Addr,
    ) -> Result<String> {
        self.create_calls
            .lock()
            .unwrap()
            .push((sub_domain.to_string(), main_domain.to_string(), ip));
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "QuotaExceeded"));
        }

        let record_id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.records.lock().unwrap().push((
            main_domain.to_string(),
            DnsRecord::new(record_id.clone(), sub_domain, ip.to_string(), "ENABLE"),
        ));
        Ok(record_id)
    }

    async fn update_record(&self, record_id: &str, sub_domain: &str, ip: Ipv4Addr) -> Result<()> {
        self.update_calls.lock().unwrap().push(UpdateCall {
            record_id: record_id.to_string(),
            sub_domain: sub_domain.to_string(),
            ip,
        });
        if self.failing_updates.lock().unwrap().contains(record_id) {
            return Err(Error::provider("mock", "InternalError"));
        }

        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|(_, r)| r.record_id == record_id) {
            Some((_, record)) => {
                record.value = ip.to_string();
                Ok(())
            }
            None => Err(Error::provider("mock", "DomainRecordNotBelongToUser")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IP source that answers from a script and counts its calls
///
/// The last scripted answer repeats once the script runs out.
pub struct ScriptedIpSource {
    name: String,
    script: Mutex<VecDeque<std::result::Result<Ipv4Addr, String>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn ok(name: &str, ip: Ipv4Addr) -> Self {
        Self::sequence(name, vec![Ok(ip)])
    }

    pub fn failing(name: &str, reason: &str) -> Self {
        Self::sequence(name, vec![Err(reason.to_string())])
    }

    pub fn sequence(name: &str, script: Vec<std::result::Result<Ipv4Addr, String>>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter that stays readable after the source is boxed
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn fetch(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut script = self.script.lock().unwrap();
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        match next {
            Some(Ok(ip)) => Ok(ip),
            Some(Err(reason)) => Err(Error::ip_source(reason)),
            None => Err(Error::ip_source("script empty")),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A notifier that records messages
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails (after recording the attempt)
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::notify("webhook returned 502"));
        }
        Ok(())
    }
}

pub fn ip(a: u8, b: u8, c: u8, d: u8) -> Ipv4Addr {
    Ipv4Addr::new(a, b, c, d)
}

pub fn reconciler(provider: &Arc<MockDnsProvider>, notifier: &Arc<RecordingNotifier>) -> Reconciler {
    Reconciler::new(provider.clone(), notifier.clone())
}

pub fn resolver_with(ip: Ipv4Addr) -> IpResolver {
    IpResolver::new(vec![Box::new(ScriptedIpSource::ok("scripted", ip))])
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(domains: &[&str]) -> DdnsConfig {
    let mut config = DdnsConfig::new(
        "test-access-key",
        "test-access-secret",
        domains.iter().map(|d| d.to_string()).collect(),
    );
    config.interval_secs = 60;
    config
}
