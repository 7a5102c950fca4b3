//! Static, read-only tables that drive the analysis: key size standards,
//! curve equivalences, provider markers, organization patterns and the catalogue
//! of findings with their remediation text.
//!
//! Everything here is immutable and shared by every concurrent analysis.

use crate::core::models::{KeyAlgorithm, Severity};

/// Size thresholds (in bits) used to score a key and flag it as weak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStandard {
    pub weak_threshold: u32,
    pub minimum_secure: u32,
    pub recommended: u32,
}

/// Returns the standard for an algorithm family, or `None` when the family has
/// no published thresholds.
pub fn key_standard(algorithm: KeyAlgorithm) -> Option<&'static KeyStandard> {
    KEY_SECURITY_STANDARDS
        .iter()
        .find(|(alg, _)| *alg == algorithm)
        .map(|(_, standard)| standard)
}

static KEY_SECURITY_STANDARDS: &[(KeyAlgorithm, KeyStandard)] = &[
    (KeyAlgorithm::Rsa, KeyStandard { weak_threshold: 2048, minimum_secure: 2048, recommended: 4096 }),
    (KeyAlgorithm::Ec, KeyStandard { weak_threshold: 256, minimum_secure: 256, recommended: 384 }),
    (KeyAlgorithm::Dsa, KeyStandard { weak_threshold: 2048, minimum_secure: 2048, recommended: 3072 }),
];

/// Curve size to comparable RSA modulus size.
pub static ECC_RSA_EQUIVALENTS: &[(u32, u32)] = &[
    (160, 1024),
    (224, 2048),
    (256, 3072),
    (384, 7680),
    (521, 15360),
];

/// Named curves by OID: (oid, curve name, field size in bits).
pub static NAMED_CURVES: &[(&str, &str, u32)] = &[
    ("1.2.840.10045.3.1.1", "prime192v1", 192),
    ("1.3.132.0.33", "secp224r1", 224),
    ("1.2.840.10045.3.1.7", "prime256v1", 256),
    ("1.3.132.0.10", "secp256k1", 256),
    ("1.3.132.0.34", "secp384r1", 384),
    ("1.3.132.0.35", "secp521r1", 521),
    ("1.3.36.3.3.2.8.1.1.7", "brainpoolP256r1", 256),
    ("1.3.36.3.3.2.8.1.1.11", "brainpoolP384r1", 384),
    ("1.3.36.3.3.2.8.1.1.13", "brainpoolP512r1", 512),
];

/// Provider label to the lower-case substrings that betray it. Order matters:
/// the first provider with a matching marker wins.
pub static CDN_PROVIDERS: &[(&str, &[&str])] = &[
    ("Cloudflare", &["cloudflare", "cf-ray", "cf-cache-status"]),
    ("Fastly", &["fastly", "fastly-cache", "x-served-by"]),
    ("Akamai", &["akamai", "edgekey", "edgesuite", "akamaitechnologies"]),
    ("Maxcdn", &["maxcdn", "netdna"]),
    ("Amazon", &["cloudfront", "amazonaws"]),
    ("Google", &["googleapis", "googleusercontent", "gstatic"]),
    ("Microsoft", &["azureedge", "azure"]),
    ("Keycdn", &["keycdn"]),
    ("Bunnycdn", &["bunnycdn"]),
    ("Stackpath", &["stackpath", "netdna-ssl"]),
    ("Jsdelivr", &["jsdelivr"]),
    ("Unpkg", &["unpkg"]),
    ("Cdnjs", &["cdnjs"]),
];

/// Substrings that suggest some CDN when no provider marker matched.
pub static GENERIC_CDN_MARKERS: &[&str] = &["cdn", "cache", "edge"];

pub const GENERIC_CDN_LABEL: &str = "CDN Detected";

/// Response headers whose mere presence names a CDN, checked in order. The
/// `server` header is matched against [`CDN_PROVIDERS`] instead.
pub static CDN_HEADERS: &[(&str, &str)] = &[
    ("cf-ray", "Cloudflare"),
    ("cf-cache-status", "Cloudflare"),
    ("x-served-by", "Fastly"),
    ("x-cache", "Various CDN"),
    ("x-edge-location", "CloudFront"),
    ("x-amz-cf-id", "CloudFront"),
];

/// Reverse-DNS substrings mapped to a hosting organization.
pub static ORGANIZATION_PATTERNS: &[(&str, &str)] = &[
    ("google", "GOOGLE"),
    ("amazon", "AMAZON"),
    ("microsoft", "MICROSOFT"),
    ("cloudflare", "CLOUDFLARE"),
    ("fastly", "FASTLY"),
    ("akamai", "AKAMAI"),
    ("digitalocean", "DIGITALOCEAN"),
    ("linode", "LINODE"),
    ("siteground", "SITEGROUND"),
    ("ovh", "OVH"),
    ("hetzner", "HETZNER"),
];

/// Coarse location for organizations that serve from everywhere:
/// (organization, country, region).
pub static GLOBAL_ORGANIZATIONS: &[(&str, &str, &str)] = &[
    ("GOOGLE", "United States", "Global"),
    ("CLOUDFLARE", "Global CDN", "Worldwide"),
    ("AMAZON", "United States", "AWS Global"),
];

/// Reverse-DNS suffix hints: (substring, country, city, timezone).
pub static COUNTRY_HINTS: &[(&str, &str, &str, &str)] = &[
    (".de", "Germany", "Multiple Cities", "Europe/Berlin"),
    (".uk", "United Kingdom", "London", "Europe/London"),
    (".fr", "France", "Paris", "Europe/Paris"),
    (".nl", "The Netherlands", "Amsterdam", "Europe/Amsterdam"),
    (".se", "Sweden", "Stockholm", "Europe/Stockholm"),
    (".dk", "Denmark", "Copenhagen", "Europe/Copenhagen"),
    (".us", "United States", "Multiple Cities", "America/New_York"),
    (".ca", "Canada", "Toronto", "America/Toronto"),
];

/// Well-known TXT record prefixes and the tag prepended to them.
pub static TXT_RECORD_TAGS: &[(&str, &str)] = &[
    ("v=spf1", "SPF"),
    ("v=DKIM1", "DKIM"),
    ("v=DMARC1", "DMARC"),
    ("google-site-verification", "Google Verification"),
    ("facebook-domain-verification", "Facebook Verification"),
    ("MS=", "Microsoft Verification"),
];

/// A catalogued security finding.
pub struct FindingDetail {
    /// Machine-readable identifier, e.g. "CERT_EXPIRED".
    pub code: &'static str,
    /// Short category label reported as the vulnerability type.
    pub title: &'static str,
    pub severity: Severity,
    /// Description used when the finding carries no runtime detail.
    pub description: &'static str,
    /// Imperative remediation reported as a recommendation.
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- Certificate ---
    FindingDetail {
        code: "CERT_EXPIRED",
        title: "Certificate Expired",
        severity: Severity::Critical,
        description: "SSL certificate has expired and requires immediate renewal",
        remediation: "Renew the SSL certificate immediately and automate future renewals",
    },
    FindingDetail {
        code: "CERT_EXPIRING_SOON",
        title: "Certificate Expiring Soon",
        severity: Severity::Warning,
        description: "Certificate expires in less than 30 days",
        remediation: "Schedule certificate renewal within the next 30 days",
    },
    FindingDetail {
        code: "KEY_WEAK",
        title: "Weak Key Size",
        severity: Severity::High,
        description: "Public key size is below the recommended minimum",
        remediation: "Replace the key with at least a 2048-bit RSA key or a P-256 ECC key",
    },
    FindingDetail {
        code: "KEY_BELOW_RECOMMENDED",
        title: "Key Below Recommended Size",
        severity: Severity::Low,
        description: "Public key meets the minimum but not the recommended size",
        remediation: "Consider upgrading to a 4096-bit RSA key or ECC (P-384)",
    },
    FindingDetail {
        code: "SIGNATURE_LEGACY",
        title: "Legacy Signature Algorithm",
        severity: Severity::High,
        description: "Certificate is signed with SHA-1 or MD5",
        remediation: "Reissue the certificate with a SHA-256 or stronger signature",
    },
    // --- HTTP headers ---
    FindingDetail {
        code: "HEADERS_HSTS_MISSING",
        title: "Missing HSTS Header",
        severity: Severity::Medium,
        description: "Strict-Transport-Security header not found",
        remediation: "Implement HSTS header with includeSubDomains",
    },
    FindingDetail {
        code: "HEADERS_CSP_MISSING",
        title: "Missing CSP Header",
        severity: Severity::Low,
        description: "Content-Security-Policy header not found",
        remediation: "Implement Content Security Policy",
    },
    FindingDetail {
        code: "HEADERS_X_FRAME_OPTIONS_MISSING",
        title: "Missing X-Frame-Options Header",
        severity: Severity::Low,
        description: "X-Frame-Options header not found",
        remediation: "Set X-Frame-Options to DENY or SAMEORIGIN",
    },
    FindingDetail {
        code: "HEADERS_X_CONTENT_TYPE_OPTIONS_MISSING",
        title: "Missing X-Content-Type-Options Header",
        severity: Severity::Low,
        description: "X-Content-Type-Options header not found",
        remediation: "Set X-Content-Type-Options to nosniff",
    },
];

/// Looks up a catalogued finding by its code.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_family_but_unknown_has_a_standard() {
        assert!(key_standard(KeyAlgorithm::Rsa).is_some());
        assert!(key_standard(KeyAlgorithm::Ec).is_some());
        assert!(key_standard(KeyAlgorithm::Dsa).is_some());
        assert!(key_standard(KeyAlgorithm::Unknown).is_none());
    }

    #[test]
    fn standards_are_ordered() {
        for alg in [KeyAlgorithm::Rsa, KeyAlgorithm::Ec, KeyAlgorithm::Dsa] {
            let s = key_standard(alg).unwrap();
            assert!(s.weak_threshold <= s.minimum_secure && s.minimum_secure <= s.recommended);
        }
    }

    #[test]
    fn finding_codes_are_unique() {
        for (i, a) in FINDINGS.iter().enumerate() {
            assert!(FINDINGS[i + 1..].iter().all(|b| b.code != a.code), "duplicate {}", a.code);
        }
        assert!(get_finding_detail("CERT_EXPIRED").is_some());
        assert!(get_finding_detail("NOPE").is_none());
    }

    #[test]
    fn provider_markers_are_lowercase() {
        for (_, markers) in CDN_PROVIDERS {
            for marker in *markers {
                assert_eq!(*marker, marker.to_lowercase());
            }
        }
    }
}
