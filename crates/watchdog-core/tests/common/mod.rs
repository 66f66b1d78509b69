//! Test doubles shared by the provider and orchestrator contract tests
//!
//! These doubles record what they were asked to do instead of talking to
//! any DNS provider.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use watchdog_core::traits::{DnsProvider, RecordUpdater, RunReport, update_families};
use watchdog_core::{Enable, Error, IpFamily, Ips, Subdomain};

/// One record operation seen by a [`RecordingProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub family: IpFamily,
    pub domain: String,
    pub ip: String,
}

/// A provider that records every record operation and fails on demand
pub struct RecordingProvider {
    name: &'static str,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    failing_families: HashSet<IpFamily>,
    failing_domains: HashSet<String>,
}

impl RecordingProvider {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Arc::new(Mutex::new(Vec::new())),
            failing_families: HashSet::new(),
            failing_domains: HashSet::new(),
        }
    }

    /// Make every operation of `family` fail
    pub fn failing_family(mut self, family: IpFamily) -> Self {
        self.failing_families.insert(family);
        self
    }

    /// Make every operation on `domain` fail
    pub fn failing_domain(mut self, domain: &str) -> Self {
        self.failing_domains.insert(domain.to_string());
        self
    }

    /// Handle on the call log, usable after the provider is moved away
    pub fn call_log(&self) -> Arc<Mutex<Vec<RecordedCall>>> {
        Arc::clone(&self.calls)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, family: IpFamily) -> usize {
        self.calls().iter().filter(|c| c.family == family).count()
    }
}

#[async_trait]
impl RecordUpdater for RecordingProvider {
    async fn update_record(&self, family: IpFamily, domain: &str, ip: &str) -> Result<String, Error> {
        self.calls.lock().unwrap().push(RecordedCall {
            family,
            domain: domain.to_string(),
            ip: ip.to_string(),
        });

        if self.failing_families.contains(&family) || self.failing_domains.contains(domain) {
            return Err(Error::provider(self.name, format!("{} rejected", domain)));
        }

        Ok(format!("{} {} -> {}", family.record_type(), domain, ip))
    }
}

#[async_trait]
impl DnsProvider for RecordingProvider {
    async fn run(&self, enable: Enable, subdomain: &Subdomain, ips: &Ips) -> RunReport {
        update_families(self, enable, subdomain, ips).await
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}

/// A provider whose task panics
pub struct PanickingProvider;

#[async_trait]
impl DnsProvider for PanickingProvider {
    async fn run(&self, _enable: Enable, _subdomain: &Subdomain, _ips: &Ips) -> RunReport {
        panic!("provider blew up");
    }

    fn provider_name(&self) -> &'static str {
        "huaweicloud"
    }
}

/// A provider that only finishes once every peer sharing its barrier runs
pub struct RendezvousProvider {
    pub name: &'static str,
    pub barrier: Arc<tokio::sync::Barrier>,
}

#[async_trait]
impl DnsProvider for RendezvousProvider {
    async fn run(&self, enable: Enable, subdomain: &Subdomain, _ips: &Ips) -> RunReport {
        self.barrier.wait().await;

        IpFamily::ALL
            .into_iter()
            .filter(|family| family.is_enabled(&enable))
            .map(|family| {
                watchdog_core::Outcome::new(
                    self.name,
                    family,
                    subdomain.get(family),
                    Ok("met peer".to_string()),
                )
            })
            .collect()
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}

/// Addresses used by most tests
pub fn sample_ips() -> Ips {
    Ips::new("203.0.113.7", "2001:db8::7")
}
