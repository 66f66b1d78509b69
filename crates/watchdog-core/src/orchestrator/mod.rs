//! Run-cycle orchestration
//!
//! The Orchestrator is responsible for:
//! - Holding the configured providers, each with its own record names
//! - Running all of them for one set of resolved addresses
//! - Merging their reports without losing any outcome
//!
//! ## Cycle Flow
//!
//! ```text
//!                  ┌──────────────┐
//!   Ips ─────────▶ │ Orchestrator │
//!                  └──────────────┘
//!                         │ one task per provider
//!         ┌───────────────┼───────────────┐
//!         ▼               ▼               ▼
//! ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//! │ DnsProvider │ │ DnsProvider │ │ DnsProvider │
//! └─────────────┘ └─────────────┘ └─────────────┘
//!         │               │               │
//!         └──────── RunReport (merged in registration order)
//! ```
//!
//! Timers, retries and deadlines belong to the caller.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::domain::parse_domains;
use crate::error::{Error, Result};
use crate::registry::ProviderRegistry;
use crate::traits::{DnsProvider, Outcome, RunReport};
use crate::types::{CenterReq, Enable, IpFamily, Ips, Subdomain};

/// A provider together with the records it manages
#[derive(Clone)]
pub struct ProviderEntry {
    pub provider: Arc<dyn DnsProvider>,
    pub subdomain: Subdomain,
}

impl ProviderEntry {
    pub fn new(provider: Arc<dyn DnsProvider>, subdomain: Subdomain) -> Self {
        Self {
            provider,
            subdomain,
        }
    }
}

/// Drives every configured provider through one run cycle
pub struct Orchestrator {
    entries: Vec<ProviderEntry>,
}

impl Orchestrator {
    pub fn new(entries: Vec<ProviderEntry>) -> Self {
        Self { entries }
    }

    /// Build every provider named in `config` through `registry`
    ///
    /// Fails on the first entry that cannot be built; a half-configured
    /// provider set is a configuration error, not a runtime one.
    pub fn from_config(registry: &ProviderRegistry, config: &ClientConfig) -> Result<Self> {
        let mut entries = Vec::with_capacity(config.providers.len());

        for provider_config in &config.providers {
            let provider = registry.create_provider(provider_config)?;
            entries.push(ProviderEntry::new(
                Arc::from(provider),
                provider_config.subdomain.clone(),
            ));
        }

        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run all providers concurrently and merge their reports
    ///
    /// Reports are merged in registration order regardless of which
    /// provider finishes first. A provider task that panics is recorded as
    /// a failed outcome for each record it would have processed.
    pub async fn run_cycle(&self, enable: Enable, ips: &Ips) -> RunReport {
        tracing::debug!("Running {} provider(s)", self.entries.len());

        let handles: Vec<_> = self
            .entries
            .iter()
            .map(move |entry| {
                let provider = Arc::clone(&entry.provider);
                let subdomain = entry.subdomain.clone();
                let ips = ips.clone();
                tokio::spawn(async move { provider.run(enable, &subdomain, &ips).await })
            })
            .collect();

        let mut report = RunReport::new();
        for (entry, handle) in self.entries.iter().zip(handles) {
            match handle.await {
                Ok(provider_report) => report.merge(provider_report),
                Err(e) => {
                    let name = entry.provider.provider_name();
                    tracing::error!("[{}] provider task failed: {}", name, e);
                    for family in IpFamily::ALL {
                        if !family.is_enabled(&enable) {
                            continue;
                        }
                        for domain in parse_domains(entry.subdomain.get(family)) {
                            report.push(Outcome::new(
                                name,
                                family,
                                domain,
                                Err(Error::provider(name, format!("task failed: {}", e))),
                            ));
                        }
                    }
                }
            }
        }

        report
    }
}

/// Families whose address differs from the last pushed one
///
/// Only families enabled in `enable` can stay set. Addresses are compared
/// as strings, which is sound because IPv6 values are stored canonically.
pub fn changed_families(enable: Enable, previous: &Ips, current: &Ips) -> Enable {
    Enable {
        ipv4: enable.ipv4 && previous.ipv4 != current.ipv4,
        ipv6: enable.ipv6 && previous.ipv6 != current.ipv6,
    }
}

/// Build the central report payload
pub fn center_request(token: impl Into<String>, enable: Enable, ips: &Ips) -> CenterReq {
    CenterReq {
        token: token.into(),
        enable,
        ip: ips.clone(),
    }
}
