// # DNS Provider Trait
//
// Defines the capability every DNS provider integration implements.
//
// ## Implementations
//
// - Cloudflare: `watchdog-provider-cloudflare` crate
// - DNSPod, AliDNS, HuaweiCloud: keys reserved in `constants`
//
// ## Usage
//
// ```rust,ignore
// use watchdog_core::{DnsProvider, Enable, Ips, Subdomain};
//
// let report = provider
//     .run(Enable::new(true, true), &Subdomain::new("a.com", "a.com"), &ips)
//     .await;
//
// for message in report.messages() {
//     println!("{}", message);
// }
// for error in report.errors() {
//     eprintln!("{}", error);
// }
// ```

use async_trait::async_trait;
use std::fmt;

use crate::Error;
use crate::config::ProviderConfig;
use crate::domain::parse_domains;
use crate::types::{Enable, IpFamily, Ips, Subdomain};

/// Result of one record operation, tagged with what it was about
#[derive(Debug)]
pub struct Outcome {
    /// Key of the provider that ran the operation
    pub provider: &'static str,
    /// Family, and therefore record type, of the operation
    pub family: IpFamily,
    /// Record name
    pub domain: String,
    /// Success message, or the error that stopped this operation
    pub result: Result<String, Error>,
}

impl Outcome {
    pub fn new(
        provider: &'static str,
        family: IpFamily,
        domain: impl Into<String>,
        result: Result<String, Error>,
    ) -> Self {
        Self {
            provider,
            family,
            domain: domain.into(),
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = format!(
            "[{}] {} {}",
            self.provider,
            self.family.record_type(),
            self.domain
        );
        match &self.result {
            Ok(message) => write!(f, "{}: {}", prefix, message),
            Err(error) => write!(f, "{}: {}", prefix, error),
        }
    }
}

/// Ordered outcomes of one or more provider runs
///
/// Successes and failures live in the same sequence; a failure never hides
/// the successes recorded before or after it.
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: Vec<Outcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// Append every outcome of `other`, keeping its order
    pub fn merge(&mut self, other: RunReport) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }

    /// Messages of successful operations, in order
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(String::as_str))
    }

    /// Errors of failed operations, in order
    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.is_err())
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }
}

impl FromIterator<Outcome> for RunReport {
    fn from_iter<I: IntoIterator<Item = Outcome>>(iter: I) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Trait for DNS provider implementations
///
/// # Contract
///
/// - An A record update is attempted iff `enable.ipv4` is set and
///   `subdomain.a` is non-empty; likewise AAAA with `enable.ipv6` and
///   `subdomain.aaaa`.
/// - The two families are independent: a failure in one never prevents
///   the other from being attempted.
/// - Every attempted operation ends up in the returned report. Providers
///   do not short-circuit and do not drop successes because a later
///   operation failed.
/// - No retries. Callers decide whether to run again.
///
/// Providers that only need a per-record primitive should implement
/// [`RecordUpdater`] and delegate `run` to [`update_families`], which
/// applies the rules above.
///
/// # Thread Safety
///
/// Implementations must be thread-safe; the orchestrator runs providers
/// concurrently on separate tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Push `ips` to the records named in `subdomain`
    ///
    /// # Parameters
    ///
    /// - `enable`: families to process
    /// - `subdomain`: A / AAAA record names, empty when not configured
    /// - `ips`: addresses to publish, IPv6 already canonical
    async fn run(&self, enable: Enable, subdomain: &Subdomain, ips: &Ips) -> RunReport;

    /// Lowercase provider key (e.g., "cloudflare")
    fn provider_name(&self) -> &'static str;
}

/// Single-record primitive used by [`update_families`]
#[async_trait]
pub trait RecordUpdater: Send + Sync {
    /// Make the `family` record of `domain` point at `ip`
    ///
    /// Returns a human-readable message describing what was done,
    /// including "already up to date" style no-ops.
    async fn update_record(&self, family: IpFamily, domain: &str, ip: &str) -> Result<String, Error>;
}

/// Run every enabled family against every configured domain
///
/// Each family's domain string may list several domains; each one is a
/// separate operation with its own outcome. A family that is enabled and
/// has domains but no resolved address yields a failed outcome per domain.
pub async fn update_families<P>(
    provider: &P,
    enable: Enable,
    subdomain: &Subdomain,
    ips: &Ips,
) -> RunReport
where
    P: DnsProvider + RecordUpdater + ?Sized,
{
    let name = DnsProvider::provider_name(provider);
    let mut report = RunReport::new();

    for family in IpFamily::ALL {
        if !family.is_enabled(&enable) {
            tracing::debug!("[{}] {} disabled, skipping", name, family);
            continue;
        }

        let domains = parse_domains(subdomain.get(family));
        if domains.is_empty() {
            tracing::debug!(
                "[{}] no {} record configured, skipping",
                name,
                family.record_type()
            );
            continue;
        }

        let ip = ips.get(family);
        for domain in domains {
            let result = if ip.is_empty() {
                Err(Error::invalid_input(format!(
                    "no {} address resolved",
                    family
                )))
            } else {
                provider.update_record(family, &domain, ip).await
            };

            match &result {
                Ok(message) => tracing::info!("[{}] {}: {}", name, domain, message),
                Err(e) => tracing::warn!(
                    "[{}] {} update of {} failed: {}",
                    name,
                    family.record_type(),
                    domain,
                    e
                ),
            }

            report.push(Outcome::new(name, family, domain, result));
        }
    }

    report
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from its configuration entry
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object, or a configuration error when the
    /// entry's options are unusable
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>, Error>;
}
