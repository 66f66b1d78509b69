//! Contract Test: Orchestrator Aggregation
//!
//! Constraints verified:
//! - Providers run concurrently
//! - Reports are merged in registration order
//! - A failing or panicking provider never discards other providers' results
//! - A panicking provider fails every record it was configured for
//! - Providers are built from configuration through the registry
//!
//! If this test fails, a run cycle can silently lose updates.

mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use watchdog_core::config::{ClientConfig, ProviderConfig};
use watchdog_core::traits::{DnsProvider, DnsProviderFactory};
use watchdog_core::{
    Enable, Error, IpFamily, Orchestrator, ProviderEntry, ProviderRegistry, Subdomain,
};

#[tokio::test]
async fn reports_are_merged_in_registration_order() {
    let failing = RecordingProvider::new("alidns").failing_family(IpFamily::V4);
    let healthy = RecordingProvider::new("dnspod");

    let orchestrator = Orchestrator::new(vec![
        ProviderEntry::new(Arc::new(failing), Subdomain::new("a.example.com", "")),
        ProviderEntry::new(Arc::new(healthy), Subdomain::new("b.example.com", "")),
    ]);

    let report = orchestrator
        .run_cycle(Enable::new(true, false), &sample_ips())
        .await;

    let providers: Vec<&str> = report.outcomes().iter().map(|o| o.provider).collect();
    assert_eq!(providers, vec!["alidns", "dnspod"]);
    assert_eq!(report.errors().count(), 1);
    assert_eq!(report.messages().count(), 1);
}

#[tokio::test]
async fn panicking_provider_is_reported_as_failure() {
    let healthy = RecordingProvider::new("cloudflare");
    let log = healthy.call_log();

    let orchestrator = Orchestrator::new(vec![
        ProviderEntry::new(
            Arc::new(PanickingProvider),
            Subdomain::new("a.example.com", "a.example.com"),
        ),
        ProviderEntry::new(Arc::new(healthy), Subdomain::new("b.example.com", "")),
    ]);

    let report = orchestrator
        .run_cycle(Enable::new(true, true), &sample_ips())
        .await;

    assert_eq!(log.lock().unwrap().len(), 1);
    assert_eq!(report.errors().count(), 2, "one failure per configured family");
    assert_eq!(report.messages().count(), 1);
    assert!(
        report
            .errors()
            .all(|e| matches!(e, Error::Provider { provider, .. } if provider == "huaweicloud"))
    );
}

#[tokio::test]
async fn panicking_provider_fails_each_listed_domain() {
    let orchestrator = Orchestrator::new(vec![ProviderEntry::new(
        Arc::new(PanickingProvider),
        Subdomain::new("a.example.com, b.example.com", " , "),
    )]);

    let report = orchestrator
        .run_cycle(Enable::new(true, true), &sample_ips())
        .await;

    // Same domain list rules as a provider that ran normally
    let failed: Vec<(IpFamily, &str)> = report
        .outcomes()
        .iter()
        .map(|o| (o.family, o.domain.as_str()))
        .collect();
    assert_eq!(
        failed,
        vec![(IpFamily::V4, "a.example.com"), (IpFamily::V4, "b.example.com")]
    );
    assert_eq!(report.errors().count(), 2);
}

#[tokio::test]
async fn providers_run_concurrently() {
    let barrier = Arc::new(tokio::sync::Barrier::new(2));

    let orchestrator = Orchestrator::new(vec![
        ProviderEntry::new(
            Arc::new(RendezvousProvider {
                name: "dnspod",
                barrier: Arc::clone(&barrier),
            }),
            Subdomain::new("a.example.com", ""),
        ),
        ProviderEntry::new(
            Arc::new(RendezvousProvider {
                name: "alidns",
                barrier: Arc::clone(&barrier),
            }),
            Subdomain::new("b.example.com", ""),
        ),
    ]);

    // Sequential execution would leave the first provider waiting forever
    let report = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.run_cycle(Enable::new(true, false), &sample_ips()),
    )
    .await
    .expect("providers did not run concurrently");

    assert_eq!(report.messages().count(), 2);
}

struct RecordingFactory;

impl DnsProviderFactory for RecordingFactory {
    fn create(&self, config: &ProviderConfig) -> watchdog_core::Result<Box<dyn DnsProvider>> {
        if config.option_str("token").is_none() {
            return Err(Error::config("token is required"));
        }
        Ok(Box::new(RecordingProvider::new("dnspod")))
    }
}

#[tokio::test]
async fn orchestrator_is_built_from_configuration() {
    let registry = ProviderRegistry::new();
    registry.register_provider("dnspod", Box::new(RecordingFactory));

    let mut config = ClientConfig::new();
    config.providers.push(
        ProviderConfig::new("dnspod", Subdomain::new("a.example.com", ""))
            .with_options(serde_json::json!({ "token": "id,secret" })),
    );

    let orchestrator = Orchestrator::from_config(&registry, &config).unwrap();
    assert_eq!(orchestrator.len(), 1);

    let report = orchestrator.run_cycle(config.enable, &sample_ips()).await;
    assert_eq!(report.messages().count(), 1);
}

#[test]
fn bad_provider_entry_fails_the_whole_build() {
    let registry = ProviderRegistry::new();
    registry.register_provider("dnspod", Box::new(RecordingFactory));

    let mut config = ClientConfig::new();
    config
        .providers
        .push(ProviderConfig::new("dnspod", Subdomain::new("a.example.com", "")));

    assert!(Orchestrator::from_config(&registry, &config).is_err());
}
