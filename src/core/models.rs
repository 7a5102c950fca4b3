// src/core/models.rs

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use url::Url;

use crate::core::error::AnalysisError;
use crate::core::scanner::key_strength::{classify_key, ecc_rsa_equivalent};

/// Port used when the caller does not name one.
pub const DEFAULT_PORT: u16 = 443;

/// Certificates with fewer remaining days than this are reported as expiring soon.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

// --- Target ---

/// The endpoint under analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    /// Normalizes user input into a host and port.
    ///
    /// Accepts a bare hostname, an IP address, or a URL. Scheme, path and query
    /// are dropped; a port written into the input wins over `default_port`.
    pub fn parse(input: &str, default_port: u16) -> Result<Self, AnalysisError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::InvalidTarget("target is required".to_string()));
        }

        if let Ok(ip) = trimmed.parse::<IpAddr>() {
            return Ok(Self { host: ip.to_string(), port: default_port });
        }

        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| AnalysisError::InvalidTarget(format!("{}: {}", trimmed, e)))?;
        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AnalysisError::InvalidTarget(format!("{}: no host", trimmed)))?;

        // `Url` drops a port equal to the scheme default, so look at the input itself.
        let port = if has_explicit_port(&with_scheme) {
            url.port_or_known_default().unwrap_or(default_port)
        } else {
            default_port
        };

        Ok(Self { host, port })
    }

    /// The host as an address, when it is written as one.
    pub fn ip_literal(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }
}

/// Whether the authority of `url` carries a `:port` suffix.
fn has_explicit_port(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let after_host = host_port.rsplit_once(']').map_or(host_port, |(_, after)| after);
    after_host.split_once(':').is_some_and(|(_, port)| !port.is_empty())
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// --- Findings ---

/// Finding severity, most severe first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Warning,
    Low,
}

/// A single issue derived from certificate or header facts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vulnerability {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

// --- Public key ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
pub enum KeyAlgorithm {
    #[serde(rename = "RSA")]
    #[strum(serialize = "RSA")]
    Rsa,
    #[serde(rename = "EC")]
    #[strum(serialize = "EC")]
    Ec,
    #[serde(rename = "DSA")]
    #[strum(serialize = "DSA")]
    Dsa,
    Unknown,
}

/// Ordered verdict of the key strength classifier, weakest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum SecurityLevel {
    Unknown,
    #[serde(rename = "Critically Weak")]
    #[strum(serialize = "Critically Weak")]
    CriticallyWeak,
    Weak,
    #[serde(rename = "Weak (Legacy)")]
    #[strum(serialize = "Weak (Legacy)")]
    WeakLegacy,
    Legacy,
    Adequate,
    Good,
    #[serde(rename = "Very Good")]
    #[strum(serialize = "Very Good")]
    VeryGood,
    Excellent,
}

/// Public key facts. `security_level` and `rsa_equivalent` are always derived from
/// `(algorithm, size)` in [`PublicKeyInfo::new`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "StoredPublicKey")]
pub struct PublicKeyInfo {
    pub(crate) algorithm: KeyAlgorithm,
    pub(crate) size: Option<u32>,
    pub(crate) type_detail: String,
    pub(crate) security_level: SecurityLevel,
    pub(crate) rsa_equivalent: Option<u32>,
}

impl PublicKeyInfo {
    pub fn new(algorithm: KeyAlgorithm, size: Option<u32>, type_detail: impl Into<String>) -> Self {
        let rsa_equivalent = match algorithm {
            KeyAlgorithm::Ec => size.map(ecc_rsa_equivalent),
            _ => None,
        };
        Self {
            algorithm,
            size,
            type_detail: type_detail.into(),
            security_level: classify_key(algorithm, size),
            rsa_equivalent,
        }
    }

    pub fn unknown() -> Self {
        Self::new(KeyAlgorithm::Unknown, None, "Unknown")
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    pub fn size(&self) -> Option<u32> {
        self.size
    }

    pub fn type_detail(&self) -> &str {
        &self.type_detail
    }

    pub fn security_level(&self) -> SecurityLevel {
        self.security_level
    }

    pub fn rsa_equivalent(&self) -> Option<u32> {
        self.rsa_equivalent
    }
}

/// The recorded half of a key. Derived fields in stored reports are recomputed.
#[derive(Deserialize)]
struct StoredPublicKey {
    algorithm: KeyAlgorithm,
    size: Option<u32>,
    type_detail: String,
}

impl From<StoredPublicKey> for PublicKeyInfo {
    fn from(stored: StoredPublicKey) -> Self {
        Self::new(stored.algorithm, stored.size, stored.type_detail)
    }
}

// --- Certificates ---

/// Distinguished-name attributes keyed by their short name ("CN", "O", ...).
/// Repeated attributes are joined with ", ".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DistinguishedName(pub BTreeMap<String, String>);

impl DistinguishedName {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.0
            .entry(key.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        f.write_str(&parts.join(", "))
    }
}

/// Fields shared by the leaf certificate and every chain entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateDetails {
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    pub serial_number: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// Whole days left, rounded down; negative once expired.
    pub days_until_expiry: i64,
    pub is_expired: bool,
    pub is_expiring_soon: bool,
    pub signature_algorithm: String,
    pub public_key: PublicKeyInfo,
    pub san: Vec<String>,
}

impl CertificateDetails {
    /// Day count between `now` and `valid_to`, floored like a calendar countdown.
    pub fn days_between(now: DateTime<Utc>, valid_to: DateTime<Utc>) -> i64 {
        valid_to.signed_duration_since(now).num_seconds().div_euclid(86_400)
    }

    pub fn expired(days_until_expiry: i64) -> bool {
        days_until_expiry < 0
    }

    pub fn expiring_soon(days_until_expiry: i64) -> bool {
        (0..EXPIRY_WARNING_DAYS).contains(&days_until_expiry)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fingerprints {
    pub sha1: String,
    pub sha256: String,
}

/// The leaf certificate presented by the target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Certificate {
    #[serde(flatten)]
    pub details: CertificateDetails,
    pub fingerprints: Fingerprints,
}

/// One certificate of the presented chain, starting at the leaf's issuer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainEntry {
    #[serde(flatten)]
    pub details: CertificateDetails,
    pub is_ca: bool,
}

// --- HTTP headers ---

/// Security-relevant response headers. `None` means the header was not sent;
/// `Some("")` means it was sent empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecurityHeaders {
    pub http_code: Option<u16>,
    pub strict_transport_security: Option<String>,
    pub content_security_policy: Option<String>,
    pub x_frame_options: Option<String>,
    pub x_content_type_options: Option<String>,
    pub x_xss_protection: Option<String>,
    pub referrer_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl SecurityHeaders {
    pub fn from_headers(http_code: u16, headers: &BTreeMap<String, String>) -> Self {
        let get = |name: &str| headers.get(name).cloned();
        Self {
            http_code: Some(http_code),
            strict_transport_security: get("strict-transport-security"),
            content_security_policy: get("content-security-policy"),
            x_frame_options: get("x-frame-options"),
            x_content_type_options: get("x-content-type-options"),
            x_xss_protection: get("x-xss-protection"),
            referrer_policy: get("referrer-policy"),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self { error: Some(reason.into()), ..Self::default() }
    }
}

/// Unparsed response head as returned by the header fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeaders {
    pub status: u16,
    pub raw: String,
}

// --- Network signals ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum DnsRecordType {
    A,
    AAAA,
    MX,
    TXT,
    NS,
    CNAME,
    CAA,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeoLocation {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkSignals {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub reverse_dns: Option<String>,
    pub organization: Option<String>,
    pub location: Option<GeoLocation>,
    pub cdn: Option<String>,
    pub dns_records: BTreeMap<String, Vec<String>>,
    pub http_headers: BTreeMap<String, String>,
}

impl NetworkSignals {
    pub fn records(&self, record_type: DnsRecordType) -> &[String] {
        self.dns_records
            .get(&record_type.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// --- Result ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
pub enum PostureRating {
    Excellent,
    Good,
    #[serde(rename = "Needs Improvement")]
    #[strum(serialize = "Needs Improvement")]
    NeedsImprovement,
    Poor,
}

impl PostureRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => PostureRating::Excellent,
            75..=89 => PostureRating::Good,
            50..=74 => PostureRating::NeedsImprovement,
            _ => PostureRating::Poor,
        }
    }
}

/// The assembled report of one analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisResult {
    pub domain: String,
    pub port: u16,
    pub timestamp: DateTime<Local>,
    pub certificate: Certificate,
    pub certificate_chain: Vec<ChainEntry>,
    pub security_headers: SecurityHeaders,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub network: Option<NetworkSignals>,
    pub security_score: u8,
    pub rating: PostureRating,
    pub vulnerabilities: Vec<Vulnerability>,
    pub recommendations: Vec<String>,
}

/// The serialized shape of a fatal analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisFailure {
    pub error: String,
    pub domain: String,
    pub port: u16,
    pub timestamp: DateTime<Local>,
    #[serde(skip)]
    pub cause: AnalysisError,
}

impl AnalysisFailure {
    pub fn new(cause: AnalysisError, target: &Target, timestamp: DateTime<Local>) -> Self {
        Self {
            error: cause.to_string(),
            domain: target.host.clone(),
            port: target.port,
            timestamp,
            cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn target_strips_scheme_and_path() {
        let target = Target::parse("https://Example.com/login?next=1", DEFAULT_PORT).unwrap();
        assert_eq!(target.host, "example.com");
        assert_eq!(target.port, 443);
    }

    #[test]
    fn target_keeps_explicit_port() {
        let target = Target::parse("example.com:8443", DEFAULT_PORT).unwrap();
        assert_eq!(target.port, 8443);

        let target = Target::parse("example.com", 993).unwrap();
        assert_eq!(target.port, 993);
    }

    #[test]
    fn target_accepts_ip_literals() {
        let v4 = Target::parse("192.0.2.10", DEFAULT_PORT).unwrap();
        assert_eq!(v4.ip_literal(), Some("192.0.2.10".parse().unwrap()));

        let v6 = Target::parse("[2001:db8::1]:8443", DEFAULT_PORT).unwrap();
        assert_eq!(v6.host, "2001:db8::1");
        assert!(v6.ip_literal().is_some_and(|ip| ip.is_ipv6()));
        assert_eq!(Target::parse("example.com", DEFAULT_PORT).unwrap().ip_literal(), None);
    }

    #[test]
    fn bare_ipv6_uses_default_port() {
        let target = Target::parse("2001:db8::1", DEFAULT_PORT).unwrap();
        assert_eq!(target.host, "2001:db8::1");
        assert_eq!(target.port, 443);

        let target = Target::parse(" 2001:DB8::1 ", 8443).unwrap();
        assert_eq!((target.host.as_str(), target.port), ("2001:db8::1", 8443));

        let target = Target::parse("[2001:db8::1]", 8443).unwrap();
        assert_eq!((target.host.as_str(), target.port), ("2001:db8::1", 8443));
    }

    #[test]
    fn written_port_wins_even_when_it_is_the_scheme_default() {
        let target = Target::parse("example.com:443", 8443).unwrap();
        assert_eq!(target.port, 443);

        let target = Target::parse("http://example.com:80/status", 8443).unwrap();
        assert_eq!(target.port, 80);

        let target = Target::parse("https://example.com/path:443", 8443).unwrap();
        assert_eq!(target.port, 8443);

        let target = Target::parse("[2001:db8::1]:443", 8443).unwrap();
        assert_eq!(target.port, 443);

        let target = Target::parse("example.com:", 8443).unwrap();
        assert_eq!(target.port, 8443);
    }

    #[test]
    fn stored_key_levels_are_recomputed() {
        let json = r#"{"algorithm":"RSA","size":1024,"type_detail":"RSA",
            "security_level":"Excellent","rsa_equivalent":15360}"#;
        let key: PublicKeyInfo = serde_json::from_str(json).unwrap();
        assert_eq!(key, PublicKeyInfo::new(KeyAlgorithm::Rsa, Some(1024), "RSA"));
        assert_eq!(key.security_level(), SecurityLevel::WeakLegacy);
        assert_eq!(key.rsa_equivalent(), None);

        let ec = PublicKeyInfo::new(KeyAlgorithm::Ec, Some(256), "EC (prime256v1)");
        let restored: PublicKeyInfo = serde_json::from_str(&serde_json::to_string(&ec).unwrap()).unwrap();
        assert_eq!(restored, ec);
    }

    #[test]
    fn empty_target_is_rejected() {
        assert!(matches!(Target::parse("   ", DEFAULT_PORT), Err(AnalysisError::InvalidTarget(_))));
    }

    #[test]
    fn days_are_floored() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let in_30_days = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let half_day_ago = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(CertificateDetails::days_between(now, in_30_days), 30);
        assert_eq!(CertificateDetails::days_between(now, half_day_ago), -1);
    }

    #[test]
    fn expiring_soon_boundary() {
        assert!(!CertificateDetails::expiring_soon(30));
        assert!(CertificateDetails::expiring_soon(29));
        assert!(CertificateDetails::expiring_soon(0));
        assert!(!CertificateDetails::expiring_soon(-1));
        assert!(CertificateDetails::expired(-1));
        assert!(!CertificateDetails::expired(0));
    }

    #[test]
    fn distinguished_name_joins_repeated_attributes() {
        let mut dn = DistinguishedName::default();
        dn.insert("OU", "Web");
        dn.insert("CN", "example.com");
        dn.insert("OU", "Ops");
        assert_eq!(dn.get("OU"), Some("Web, Ops"));
        assert_eq!(dn.to_string(), "CN=example.com, OU=Web, Ops");
    }

    #[test]
    fn absent_and_empty_headers_differ() {
        let mut raw = BTreeMap::new();
        raw.insert("x-frame-options".to_string(), String::new());
        let headers = SecurityHeaders::from_headers(200, &raw);
        assert_eq!(headers.x_frame_options.as_deref(), Some(""));
        assert_eq!(headers.strict_transport_security, None);
    }

    #[test]
    fn rating_bands() {
        assert_eq!(PostureRating::from_score(100), PostureRating::Excellent);
        assert_eq!(PostureRating::from_score(89), PostureRating::Good);
        assert_eq!(PostureRating::from_score(50), PostureRating::NeedsImprovement);
        assert_eq!(PostureRating::from_score(0), PostureRating::Poor);
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
