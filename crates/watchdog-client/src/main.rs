// # ddns-watchdog - DDNS Watchdog Client
//
// Thin integration layer over watchdog-core. All update logic lives in the
// libraries; this binary only wires them together for one run cycle:
//
// 1. Read environment configuration and install logging
// 2. Load the settings document (writing a template if it is missing)
// 3. Register built-in providers and build them from the settings
// 4. Resolve public addresses and push the families whose address changed
//    since the last successful push, then report centrally
// 5. Remember what was pushed and print the version notice
//
// Scheduling is left to the service manager (cron, systemd timer, ...).
//
// ## Environment
//
// - `DDNS_WATCHDOG_CONFIG`: settings document path (default `conf/client.json`)
// - `DDNS_WATCHDOG_STATE`: last pushed addresses (default `conf/last_push.json`);
//   delete it to force a full push
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `DDNS_MODE=dry-run`: providers read but never write
//
// ## Example
//
// ```bash
// export DDNS_WATCHDOG_CONFIG=/etc/ddns-watchdog/client.json
// ddns-watchdog
// ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use watchdog_api::ApiClient;
use watchdog_core::config::ClientConfig;
use watchdog_core::orchestrator::{center_request, changed_families};
use watchdog_core::{
    Enable, IpFamily, Ips, Orchestrator, ProviderConfig, ProviderRegistry, RunReport, Subdomain,
    VersionNotice, settings,
};

/// Default location of the settings document
const DEFAULT_CONFIG_PATH: &str = "conf/client.json";

/// Default location of the last pushed addresses
const DEFAULT_STATE_PATH: &str = "conf/last_push.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Every operation succeeded
/// - 1: Configuration or startup error
/// - 2: At least one resolve, update or report operation failed
#[derive(Debug, Clone, Copy)]
enum WatchdogExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<WatchdogExitCode> for ExitCode {
    fn from(code: WatchdogExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Process configuration taken from the environment
struct EnvConfig {
    config_path: PathBuf,
    state_path: PathBuf,
    log_level: String,
    dry_run: bool,
}

impl EnvConfig {
    fn from_env() -> Self {
        Self {
            config_path: env::var("DDNS_WATCHDOG_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
            state_path: env::var("DDNS_WATCHDOG_STATE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_PATH)),
            log_level: env::var("DDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dry_run: env::var("DDNS_MODE").unwrap_or_default().to_lowercase() == "dry-run",
        }
    }

    fn validate(&self) -> Result<Level> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("DDNS_WATCHDOG_CONFIG cannot be empty");
        }
        if self.state_path.as_os_str().is_empty() {
            anyhow::bail!("DDNS_WATCHDOG_STATE cannot be empty");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    let env_config = EnvConfig::from_env();

    let log_level = match env_config.validate() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return WatchdogExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WatchdogExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WatchdogExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(env_config)).into()
}

/// Load, validate and run one cycle
async fn run(env_config: EnvConfig) -> WatchdogExitCode {
    let config = match load_config(&env_config).await {
        Ok(Some(config)) => config,
        Ok(None) => return WatchdogExitCode::ConfigError,
        Err(e) => {
            error!("{:#}", e);
            return WatchdogExitCode::ConfigError;
        }
    };

    let registry = ProviderRegistry::new();
    register_builtin_providers(&registry);

    let orchestrator = match Orchestrator::from_config(&registry, &config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            error!("Failed to set up providers: {}", e);
            return WatchdogExitCode::ConfigError;
        }
    };

    match run_cycle(&env_config, &config, &orchestrator).await {
        Ok(true) => WatchdogExitCode::Success,
        Ok(false) => WatchdogExitCode::RuntimeError,
        Err(e) => {
            error!("{:#}", e);
            WatchdogExitCode::RuntimeError
        }
    }
}

/// Load the settings document over the defaults
///
/// Returns `Ok(None)` after writing a template when no document exists.
async fn load_config(env_config: &EnvConfig) -> Result<Option<ClientConfig>> {
    let path = &env_config.config_path;
    let mut config = ClientConfig::default();

    let found = settings::load_into(path, &mut config)
        .await
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;

    if !found {
        settings::save(&template_config(), path)
            .await
            .with_context(|| format!("Failed to write settings template to {}", path.display()))?;
        warn!(
            "No settings found, a template was written to {}. Edit it and run again.",
            path.display()
        );
        return Ok(None);
    }

    config
        .validate()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;

    info!(
        "Settings loaded: {} provider(s), IPv4 {}, IPv6 {}",
        config.providers.len(),
        on_off(config.enable.ipv4),
        on_off(config.enable.ipv6)
    );

    Ok(Some(config))
}

/// Settings written when none exist yet
fn template_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.providers.push(
        ProviderConfig::new("cloudflare", Subdomain::new("home.example.com", ""))
            .with_options(serde_json::json!({ "api_token": "", "zone_id": "" })),
    );
    config
}

fn register_builtin_providers(registry: &ProviderRegistry) {
    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        watchdog_provider_cloudflare::register(registry);
    }

    info!("Built-in providers: {}", registry.list_providers().join(", "));
}

/// Addresses pushed by the last run, and the records they were pushed to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct PushState {
    ip: Ips,
    records: Vec<(String, Subdomain)>,
}

impl PushState {
    /// Addresses the configured records are known to hold
    ///
    /// A changed provider list invalidates the remembered addresses.
    fn previous_ips(&self, records: &[(String, Subdomain)]) -> Ips {
        if self.records == records {
            self.ip.clone()
        } else {
            Ips::default()
        }
    }
}

fn configured_records(config: &ClientConfig) -> Vec<(String, Subdomain)> {
    config
        .providers
        .iter()
        .map(|p| (p.kind.clone(), p.subdomain.clone()))
        .collect()
}

/// Addresses to remember after pushing `pending` families
///
/// A family is only recorded when every one of its operations succeeded,
/// so a failed update is retried on the next run.
fn pushed_ips(previous: &Ips, current: &Ips, pending: Enable, report: &RunReport) -> Ips {
    let mut next = previous.clone();

    for family in IpFamily::ALL {
        if !family.is_enabled(&pending) || current.get(family).is_empty() {
            continue;
        }
        let failed = report
            .outcomes()
            .iter()
            .any(|o| o.family == family && !o.is_success());
        if !failed {
            next.set(family, current.get(family));
        }
    }

    next
}

async fn load_state(path: &Path) -> PushState {
    match settings::load(path).await {
        Ok(state) => state.unwrap_or_default(),
        Err(e) => {
            warn!("Ignoring unreadable push state {}: {}", path.display(), e);
            PushState::default()
        }
    }
}

/// Resolve, update and report once
///
/// Returns whether every operation succeeded.
async fn run_cycle(
    env_config: &EnvConfig,
    config: &ClientConfig,
    orchestrator: &Orchestrator,
) -> Result<bool> {
    let client = ApiClient::new()?;
    let mut all_ok = true;

    let resolution = client.resolve(&config.api_url, config.enable).await;
    for e in &resolution.errors {
        error!("Address resolution failed: {}", e);
        all_ok = false;
    }

    let records = configured_records(config);
    let state = load_state(&env_config.state_path).await;
    let previous = state.previous_ips(&records);

    let pending = changed_families(config.enable, &previous, &resolution.ips);
    let report = if pending.any() {
        orchestrator.run_cycle(pending, &resolution.ips).await
    } else {
        info!("Addresses unchanged since the last push, no DNS update needed");
        RunReport::new()
    };

    for outcome in report.outcomes() {
        if outcome.is_success() {
            info!("{}", outcome);
        } else {
            error!("{}", outcome);
        }
    }
    if report.has_errors() {
        all_ok = false;
    }

    let next = PushState {
        ip: pushed_ips(&previous, &resolution.ips, pending, &report),
        records,
    };
    if env_config.dry_run {
        debug!("Dry-run, push state not written");
    } else if next != state {
        if let Err(e) = settings::save(&next, &env_config.state_path).await {
            error!(
                "Failed to write push state to {}: {}",
                env_config.state_path.display(),
                e
            );
            all_ok = false;
        }
    }

    if config.center.enable {
        let request = center_request(&config.center.token, config.enable, &resolution.ips);
        match client.report(&config.center.api_url, &request).await {
            Ok(response) => info!("Central report accepted: {}", response.message),
            Err(e) => {
                error!("{}", e);
                all_ok = false;
            }
        }
    }

    println!("{}", VersionNotice::new(resolution.latest_version));

    Ok(all_ok)
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
