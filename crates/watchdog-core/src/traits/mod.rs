//! Core traits for the DDNS watchdog
//!
//! - [`DnsProvider`]: Push addresses to a DNS hosting provider
//! - [`RecordUpdater`]: Single-record primitive behind most providers
//! - [`DnsProviderFactory`]: Build providers from configuration entries

pub mod dns_provider;

pub use dns_provider::{
    DnsProvider, DnsProviderFactory, Outcome, RecordUpdater, RunReport, update_families,
};
