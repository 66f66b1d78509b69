// # watchdog-core
//
// Core library for the DDNS watchdog agent.
//
// ## Architecture Overview
//
// The agent resolves the host's public addresses and pushes them to one or
// more DNS providers:
// - **types**: Data model shared with the settings file and remote endpoints
// - **ipv6**: Canonical IPv6 text so string equality detects changes
// - **version**: Version comparison and the update notice
// - **domain**: Parsing of user-entered domain lists
// - **settings**: JSON settings document load/save
// - **DnsProvider**: Trait every provider integration implements
// - **ProviderRegistry**: Plugin-based registry keyed by provider name
// - **Orchestrator**: Runs all providers for one cycle and merges reports
//
// ## Design Principles
//
// 1. **Continue and aggregate**: one failed record never hides another
//    record's success
// 2. **Plugin-Based**: Providers are registered by key, no hard-coded match
// 3. **Library-First**: The client binary is a thin layer over this crate

pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod ipv6;
pub mod orchestrator;
pub mod registry;
pub mod settings;
pub mod traits;
pub mod types;
pub mod version;

// Re-export core types for convenience
pub use config::{ApiUrl, CenterConfig, ClientConfig, ProviderConfig};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, ProviderEntry};
pub use registry::ProviderRegistry;
pub use traits::{DnsProvider, DnsProviderFactory, Outcome, RecordUpdater, RunReport};
pub use types::{CenterReq, Enable, GeneralResp, GetIpResp, IpFamily, Ips, Subdomain};
pub use version::VersionNotice;
