//! Data model shared by the agent, the providers and the remote endpoints
//!
//! Field keys are part of the wire and settings formats; do not rename them.
//! A key missing from a document takes its zero value, so an absent string
//! reads as the empty "not configured" sentinel.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ipv6::canonicalize_ipv6;

/// Per-family opt-in flags
///
/// These flags are the only gate for processing a family: a disabled family
/// is never resolved, updated or reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enable {
    pub ipv4: bool,
    pub ipv6: bool,
}

impl Enable {
    pub fn new(ipv4: bool, ipv6: bool) -> Self {
        Self { ipv4, ipv6 }
    }

    /// True when at least one family is enabled
    pub fn any(&self) -> bool {
        self.ipv4 || self.ipv6
    }
}

/// Target record names
///
/// An empty string means "not configured" for that family. Each field may
/// hold several domains separated by commas (see [`crate::domain::parse_domains`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subdomain {
    pub a: String,
    pub aaaa: String,
}

impl Subdomain {
    pub fn new(a: impl Into<String>, aaaa: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            aaaa: aaaa.into(),
        }
    }

    /// Domain string configured for `family`
    pub fn get(&self, family: IpFamily) -> &str {
        match family {
            IpFamily::V4 => &self.a,
            IpFamily::V6 => &self.aaaa,
        }
    }
}

/// Resolved addresses
///
/// The IPv6 value is kept in fully expanded form so plain string equality
/// detects changes. An empty string means "not resolved".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ips {
    pub ipv4: String,
    pub ipv6: String,
}

impl Ips {
    /// Build from raw textual addresses, expanding the IPv6 one
    pub fn new(ipv4: impl Into<String>, ipv6: impl AsRef<str>) -> Self {
        Self {
            ipv4: ipv4.into(),
            ipv6: canonicalize_ipv6(ipv6.as_ref()),
        }
    }

    /// Address resolved for `family`
    pub fn get(&self, family: IpFamily) -> &str {
        match family {
            IpFamily::V4 => &self.ipv4,
            IpFamily::V6 => &self.ipv6,
        }
    }

    /// Store an address for `family`, expanding it when it is IPv6
    pub fn set(&mut self, family: IpFamily, ip: &str) {
        match family {
            IpFamily::V4 => self.ipv4 = ip.to_string(),
            IpFamily::V6 => self.ipv6 = canonicalize_ipv6(ip),
        }
    }
}

/// Outbound status report for the central collector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenterReq {
    pub token: String,
    pub enable: Enable,
    pub ip: Ips,
}

/// Generic textual response envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralResp {
    pub message: String,
}

/// Response of the IP discovery / version-check endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetIpResp {
    pub ip: String,
    #[serde(rename = "latest_version")]
    pub version: String,
}

/// Address family, one per DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    /// Both families, IPv4 first
    pub const ALL: [IpFamily; 2] = [IpFamily::V4, IpFamily::V6];

    /// DNS record type carrying this family
    pub fn record_type(&self) -> &'static str {
        match self {
            IpFamily::V4 => "A",
            IpFamily::V6 => "AAAA",
        }
    }

    pub fn is_enabled(&self, enable: &Enable) -> bool {
        match self {
            IpFamily::V4 => enable.ipv4,
            IpFamily::V6 => enable.ipv6,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => f.write_str("IPv4"),
            IpFamily::V6 => f.write_str("IPv6"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_keys_match_wire_format() {
        let req = CenterReq {
            token: "t".to_string(),
            enable: Enable::new(true, false),
            ip: Ips::new("1.2.3.4", ""),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "token": "t",
                "enable": { "ipv4": true, "ipv6": false },
                "ip": { "ipv4": "1.2.3.4", "ipv6": "" },
            })
        );

        let resp: GetIpResp =
            serde_json::from_str(r#"{"ip":"1.2.3.4","latest_version":"1.6.0"}"#).unwrap();
        assert_eq!(resp.version, "1.6.0");

        let sub: Subdomain = serde_json::from_str(r#"{"a":"a.com","aaaa":""}"#).unwrap();
        assert_eq!(sub, Subdomain::new("a.com", ""));
    }

    #[test]
    fn missing_keys_read_as_empty() {
        let enable: Enable = serde_json::from_str(r#"{"ipv4":true}"#).unwrap();
        assert_eq!(enable, Enable::new(true, false));

        let sub: Subdomain = serde_json::from_str(r#"{"a":"x.com"}"#).unwrap();
        assert_eq!(sub, Subdomain::new("x.com", ""));

        // A discovery answer without a version still carries a usable address
        let resp: GetIpResp = serde_json::from_str(r#"{"ip":"2001:db8::1"}"#).unwrap();
        assert_eq!(resp.ip, "2001:db8::1");
        assert_eq!(resp.version, "");

        let resp: GeneralResp = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.message, "");

        let req: CenterReq = serde_json::from_str(r#"{"ip":{"ipv6":"::1"}}"#).unwrap();
        assert_eq!(req.token, "");
        assert_eq!(req.enable, Enable::default());
        assert_eq!(req.ip.ipv4, "");
    }

    #[test]
    fn ips_expand_ipv6_on_entry() {
        let mut ips = Ips::new("1.2.3.4", "2001:db8::1");
        assert_eq!(ips.ipv6, "2001:db8:0:0:0:0:0:1");

        ips.set(IpFamily::V6, "::1");
        assert_eq!(ips.get(IpFamily::V6), "0:0:0:0:0:0:0:1");

        // Empty stays empty: "not resolved" is not an address
        assert_eq!(Ips::new("", "").ipv6, "");
    }

    #[test]
    fn family_gating_follows_enable_flags() {
        let enable = Enable::new(true, false);
        assert!(IpFamily::V4.is_enabled(&enable));
        assert!(!IpFamily::V6.is_enabled(&enable));
        assert_eq!(IpFamily::V6.record_type(), "AAAA");
        assert!(enable.any());
        assert!(!Enable::default().any());
    }
}
