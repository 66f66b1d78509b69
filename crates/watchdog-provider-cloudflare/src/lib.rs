// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider for the DDNS watchdog.
//
// ## Behaviour
//
// - One record operation per (family, domain) pair, driven by
//   `watchdog_core::traits::update_families`
// - Existing record with the same content: no write
// - Existing record with different content: PATCH the content only
// - Missing record: created (TTL auto, not proxied)
// - Dry-run mode: all reads happen, writes are only logged
// - No retry, no backoff, no caching between calls
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...` (one query per parent name until a
//   zone matches)
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use watchdog_core::constants::CLOUDFLARE;
use watchdog_core::ipv6::canonicalize_ipv6;
use watchdog_core::traits::{
    DnsProvider, DnsProviderFactory, RecordUpdater, RunReport, update_families,
};
use watchdog_core::{Enable, Error, IpFamily, Ips, ProviderConfig, ProviderRegistry, Result, Subdomain};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL value meaning "automatic" for Cloudflare
const AUTO_TTL: u32 = 1;

/// Envelope around every Cloudflare API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
    content: String,
}

/// Body of a record creation request
#[derive(Debug, Serialize)]
struct NewRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

/// Entries of `options` in the provider configuration
#[derive(Debug, Deserialize)]
struct CloudflareOptions {
    #[serde(default)]
    api_token: String,
    #[serde(default)]
    zone_id: Option<String>,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended write
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone ID (optional, can be auto-detected from domain)
    zone_id: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Optional zone ID (auto-detected when absent)
    /// - `dry_run`: If true, perform GET requests but skip writes
    pub fn new(api_token: impl Into<String>, zone_id: Option<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id,
            client,
            dry_run,
        })
    }

    /// Send an authenticated request and unwrap the API envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider(CLOUDFLARE, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status.as_u16(), context, &error_text));
        }

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::provider(CLOUDFLARE, format!("Failed to parse response: {}", e)))?;

        if !body.success {
            let reasons: Vec<String> = body
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect();
            return Err(Error::provider(
                CLOUDFLARE,
                format!("{} failed: {}", context, reasons.join("; ")),
            ));
        }

        body.result.ok_or_else(|| {
            Error::provider(CLOUDFLARE, format!("{}: response has no result", context))
        })
    }

    /// Get the zone ID for a domain
    ///
    /// If zone_id is set, returns it directly. Otherwise, queries the API
    /// for each parent name of the record, most specific first, and uses
    /// the first zone the token can see.
    async fn get_zone_id(&self, domain: &str) -> Result<String> {
        if let Some(ref zone_id) = self.zone_id {
            tracing::debug!("Using pre-configured zone ID");
            return Ok(zone_id.clone());
        }

        let url = format!("{}/zones", CLOUDFLARE_API_BASE);
        for zone_name in zone_candidates(domain)? {
            tracing::debug!("Looking up zone ID for: {}", zone_name);

            let request = self.client.get(&url).query(&[("name", zone_name.as_str())]);
            let zones: Vec<Zone> = self.send(request, "Zone lookup").await?;

            if let Some(zone) = zones.into_iter().next() {
                tracing::debug!("Found zone {} with ID: {}", zone_name, zone.id);
                return Ok(zone.id);
            }
        }

        Err(Error::not_found(format!("No zone found for {}", domain)))
    }

    /// Find the record of `record_type` named `record_name`, if any
    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: &str,
    ) -> Result<Option<DnsRecord>> {
        tracing::debug!(
            "Looking up record: {} (type: {})",
            record_name,
            record_type
        );

        let url = format!("{}/zones/{}/dns_records", CLOUDFLARE_API_BASE, zone_id);
        let request = self
            .client
            .get(&url)
            .query(&[("name", record_name), ("type", record_type)]);
        let records: Vec<DnsRecord> = self.send(request, "Record lookup").await?;

        Ok(records.into_iter().next())
    }
}

#[async_trait]
impl RecordUpdater for CloudflareProvider {
    async fn update_record(&self, family: IpFamily, domain: &str, ip: &str) -> Result<String> {
        let record_type = family.record_type();
        let mode = if self.dry_run { "DRY-RUN" } else { "LIVE" };

        tracing::debug!(
            "Syncing Cloudflare record: {} -> {} ({}) [mode: {}]",
            domain,
            ip,
            record_type,
            mode
        );

        let zone_id = self.get_zone_id(domain).await?;
        let existing = self.find_record(&zone_id, domain, record_type).await?;

        match existing {
            Some(record) => {
                let current = match family {
                    IpFamily::V4 => record.content.clone(),
                    IpFamily::V6 => canonicalize_ipv6(&record.content),
                };
                if current == ip {
                    return Ok(format!("{} already points to {}", domain, ip));
                }

                if self.dry_run {
                    tracing::info!(
                        "[DRY-RUN] Would update {} record {}: {} -> {}",
                        record_type,
                        domain,
                        record.content,
                        ip
                    );
                    return Ok(format!("[dry-run] {} would be updated to {}", domain, ip));
                }

                let url = format!(
                    "{}/zones/{}/dns_records/{}",
                    CLOUDFLARE_API_BASE, zone_id, record.id
                );
                let request = self
                    .client
                    .patch(&url)
                    .json(&serde_json::json!({ "content": ip }));
                let _: serde_json::Value = self.send(request, "Record update").await?;

                Ok(format!("{} updated: {} -> {}", domain, record.content, ip))
            }
            None => {
                if self.dry_run {
                    tracing::info!(
                        "[DRY-RUN] Would create {} record {} -> {}",
                        record_type,
                        domain,
                        ip
                    );
                    return Ok(format!("[dry-run] {} would be created with {}", domain, ip));
                }

                let url = format!("{}/zones/{}/dns_records", CLOUDFLARE_API_BASE, zone_id);
                let payload = NewRecord {
                    record_type,
                    name: domain,
                    content: ip,
                    ttl: AUTO_TTL,
                    proxied: false,
                };
                let request = self.client.post(&url).json(&payload);
                let _: serde_json::Value = self.send(request, "Record creation").await?;

                Ok(format!("{} created with {}", domain, ip))
            }
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn run(&self, enable: Enable, subdomain: &Subdomain, ips: &Ips) -> RunReport {
        update_families(self, enable, subdomain, ips).await
    }

    fn provider_name(&self) -> &'static str {
        CLOUDFLARE
    }
}

/// Names that may be the zone of a record, most specific first
///
/// "home.example.co.uk" -> ["home.example.co.uk", "example.co.uk", "co.uk"].
/// The bare top-level label is never a candidate.
fn zone_candidates(domain: &str) -> Result<Vec<String>> {
    let labels: Vec<&str> = domain.trim_end_matches('.').split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(Error::invalid_input(format!("Invalid domain name: {}", domain)));
    }

    Ok((0..labels.len() - 1).map(|i| labels[i..].join(".")).collect())
}

/// Map an unsuccessful HTTP status to an error
fn status_error(status: u16, context: &str, body: &str) -> Error {
    match status {
        401 | 403 => Error::provider(
            CLOUDFLARE,
            format!(
                "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("{}: not found", context)),
        409 => Error::provider(
            CLOUDFLARE,
            format!("Conflict: Record is being updated by another process. Status: {}", status),
        ),
        429 => Error::provider(
            CLOUDFLARE,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            CLOUDFLARE,
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(
            CLOUDFLARE,
            format!("{} failed: {} - {}", context, status, body),
        ),
    }
}

/// Factory for creating Cloudflare providers
///
/// Reads `api_token` and optional `zone_id` from the entry's options.
/// Setting `DDNS_MODE=dry-run` in the environment builds dry-run providers.
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        if config.kind != CLOUDFLARE {
            return Err(Error::config("Invalid config for Cloudflare provider"));
        }

        let options: CloudflareOptions = serde_json::from_value(config.options.clone())
            .map_err(|e| Error::config(format!("Invalid Cloudflare options: {}", e)))?;

        if options.api_token.is_empty() {
            return Err(Error::config("Cloudflare API token is required"));
        }

        let dry_run = std::env::var("DDNS_MODE")
            .unwrap_or_default()
            .to_lowercase()
            == "dry-run";

        if dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Box::new(CloudflareProvider::new(
            options.api_token,
            options.zone_id,
            dry_run,
        )?))
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use watchdog_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// watchdog_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider(CLOUDFLARE, Box::new(CloudflareFactory));
}
