//! Process-wide read-only values: versions, endpoints and provider keys.

/// Version of this build, compared against the version advertised by the
/// discovery endpoints
pub const LOCAL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default IPv4 discovery / version-check endpoint
pub const DEFAULT_API_URL: &str = "https://yzyweb.cn/ddns-watchdog";

/// Default IPv6 discovery / version-check endpoint
pub const DEFAULT_IPV6_API_URL: &str = "https://yzyweb.cn/ddns-watchdog6";

/// Where releases are published
pub const PROJECT_URL: &str = "https://github.com/yzy613/ddns-watchdog";

/// Marker carried by a latest-version string when the real value is unknown
pub const VERSION_UNAVAILABLE: &str = "N/A";

// Provider keys. Keep these lowercase: config lookup is case-sensitive.

/// Tencent Cloud DNSPod
pub const DNSPOD: &str = "dnspod";
/// Alibaba Cloud DNS
pub const ALIDNS: &str = "alidns";
/// Cloudflare
pub const CLOUDFLARE: &str = "cloudflare";
/// Huawei Cloud DNS
pub const HUAWEICLOUD: &str = "huaweicloud";

/// Every provider key a configuration may name
pub const SUPPORTED_PROVIDERS: &[&str] = &[DNSPOD, ALIDNS, CLOUDFLARE, HUAWEICLOUD];

/// Check whether `name` is one of [`SUPPORTED_PROVIDERS`]
pub fn is_supported_provider(name: &str) -> bool {
    SUPPORTED_PROVIDERS.contains(&name)
}
