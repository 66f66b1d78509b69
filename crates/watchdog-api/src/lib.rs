// # Watchdog API Client
//
// HTTP client for the endpoints the agent talks to besides DNS providers:
//
// - IP discovery: one endpoint per family, each answering with
//   `{"ip": "...", "latest_version": "..."}`
// - Central report: accepts a `CenterReq` and answers with
//   `{"message": "..."}`
//
// Every request is single-shot. Retry and scheduling belong to the caller.

use std::time::Duration;

use watchdog_core::constants::VERSION_UNAVAILABLE;
use watchdog_core::{ApiUrl, CenterReq, Enable, Error, GeneralResp, GetIpResp, IpFamily, Ips, Result};

/// Default HTTP timeout for discovery and report requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Addresses and version information gathered for one cycle
#[derive(Debug, Default)]
pub struct Resolution {
    /// Resolved addresses; empty string for a family that was not resolved
    pub ips: Ips,
    /// Latest published version, or a string containing `N/A`
    pub latest_version: String,
    /// One error per enabled family that could not be resolved
    pub errors: Vec<Error>,
}

/// Client for the discovery and central report endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Query one discovery endpoint
    ///
    /// The returned `ip` is passed through unchanged; callers store it via
    /// [`Ips::set`] which canonicalizes IPv6.
    pub async fn get_ip(&self, url: &str) -> Result<GetIpResp> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!(
                "{} answered {}",
                url,
                response.status()
            )));
        }

        let body: GetIpResp = response
            .json()
            .await
            .map_err(|e| Error::http(format!("Invalid response from {}: {}", url, e)))?;

        if body.ip.trim().is_empty() {
            return Err(Error::http(format!("{} returned an empty address", url)));
        }

        Ok(body)
    }

    /// Resolve the addresses of every enabled family
    ///
    /// Families are queried independently; a failed family leaves its
    /// address empty and adds an error, without affecting the other one.
    pub async fn resolve(&self, api_url: &ApiUrl, enable: Enable) -> Resolution {
        let mut resolution = Resolution::default();
        let mut versions = Vec::new();

        for family in IpFamily::ALL {
            if !family.is_enabled(&enable) {
                continue;
            }

            let url = api_url.for_family(family);
            match self.get_ip(url).await {
                Ok(body) => {
                    tracing::debug!("Resolved {} address via {}", family, url);
                    resolution.ips.set(family, body.ip.trim());
                    versions.push(body.version);
                }
                Err(e) => {
                    tracing::warn!("Failed to resolve {} address: {}", family, e);
                    resolution.errors.push(e);
                }
            }
        }

        resolution.latest_version = latest_version(&versions);
        resolution
    }

    /// Post a status report to the central collector
    pub async fn report(&self, url: &str, request: &CenterReq) -> Result<GeneralResp> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::http(format!("Central report failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(rejection_error(status, &text));
        }

        response
            .json()
            .await
            .map_err(|e| Error::http(format!("Invalid central report response: {}", e)))
    }
}

/// Describe a non-2xx central report answer
///
/// The collector usually explains a rejection in a `GeneralResp` envelope;
/// any other body is quoted as-is.
fn rejection_error(status: reqwest::StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<GeneralResp>(body)
        .map(|resp| resp.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if detail.is_empty() {
        Error::http(format!("Central report rejected ({})", status))
    } else {
        Error::http(format!("Central report rejected ({}): {}", status, detail))
    }
}

/// Pick the latest version out of the discovery responses
///
/// The first non-empty value wins; with none, the result carries the
/// `N/A` marker so the version notice asks for a manual check.
pub fn latest_version(candidates: &[String]) -> String {
    candidates
        .iter()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} (version check failed)", VERSION_UNAVAILABLE))
}
