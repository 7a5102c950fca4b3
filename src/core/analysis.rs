// src/core/analysis.rs

//! Turns certificate and header facts into findings and remediation advice.
//!
//! Both functions read the same inputs the scorer reads, never the score itself,
//! so every finding can be traced to a concrete fact. Missing inputs are treated
//! as "nothing observed": absent headers are reported missing, an absent
//! certificate produces no certificate findings.

use tracing::debug;

use crate::core::knowledge_base::{get_finding_detail, key_standard, FindingDetail};
use crate::core::models::{CertificateDetails, SecurityHeaders, Severity, Vulnerability};
use crate::core::scoring::{key_grade, signature_strength, KeyGrade, SignatureStrength};

/// Below this many days left a renewal is recommended, well ahead of the warning.
const RENEWAL_PLANNING_DAYS: i64 = 60;

fn finding(code: &str) -> Option<&'static FindingDetail> {
    let detail = get_finding_detail(code);
    if detail.is_none() {
        debug!(code, "No catalogue entry for finding.");
    }
    detail
}

fn vulnerability(code: &str, description: Option<String>) -> Option<Vulnerability> {
    finding(code).map(|detail| Vulnerability {
        severity: detail.severity,
        kind: detail.title.to_string(),
        description: description.unwrap_or_else(|| detail.description.to_string()),
    })
}

fn remediation(code: &str) -> Option<String> {
    finding(code).map(|detail| detail.remediation.to_string())
}

fn headers_or_missing(headers: Option<&SecurityHeaders>) -> SecurityHeaders {
    headers.cloned().unwrap_or_default()
}

/// Severity-tagged issues, certificate findings first.
pub fn identify_vulnerabilities(
    cert: Option<&CertificateDetails>,
    headers: Option<&SecurityHeaders>,
) -> Vec<Vulnerability> {
    let mut found = Vec::new();

    if let Some(cert) = cert {
        if cert.is_expired {
            found.extend(vulnerability("CERT_EXPIRED", None));
        } else if cert.is_expiring_soon {
            let description = format!("Certificate expires in {} days", cert.days_until_expiry);
            found.extend(vulnerability("CERT_EXPIRING_SOON", Some(description)));
        }

        if key_grade(&cert.public_key) == Some(KeyGrade::BelowWeakThreshold) {
            let key = &cert.public_key;
            let description = match (key.size(), key_standard(key.algorithm())) {
                (Some(bits), Some(standard)) => Some(format!(
                    "{} key of {} bits is below the {}-bit minimum",
                    key.algorithm(),
                    bits,
                    standard.weak_threshold
                )),
                _ => None,
            };
            found.extend(vulnerability("KEY_WEAK", description));
        }
    }

    let headers = headers_or_missing(headers);
    if headers.strict_transport_security.is_none() {
        found.extend(vulnerability("HEADERS_HSTS_MISSING", None));
    }
    if headers.content_security_policy.is_none() {
        found.extend(vulnerability("HEADERS_CSP_MISSING", None));
    }

    debug!(count = found.len(), "Vulnerabilities identified.");
    found
}

/// Short imperative remediations. Several findings may share one recommendation.
pub fn recommendations(cert: Option<&CertificateDetails>, headers: Option<&SecurityHeaders>) -> Vec<String> {
    let mut advice = Vec::new();

    if let Some(cert) = cert {
        if cert.is_expired {
            advice.extend(remediation("CERT_EXPIRED"));
        } else if cert.days_until_expiry < RENEWAL_PLANNING_DAYS {
            advice.extend(remediation("CERT_EXPIRING_SOON"));
        }

        match key_grade(&cert.public_key) {
            Some(KeyGrade::BelowWeakThreshold) => advice.extend(remediation("KEY_WEAK")),
            Some(KeyGrade::BelowMinimumSecure | KeyGrade::BelowRecommended) => {
                advice.extend(remediation("KEY_BELOW_RECOMMENDED"))
            }
            Some(KeyGrade::Recommended) | None => {}
        }

        if signature_strength(&cert.signature_algorithm) == SignatureStrength::Legacy {
            advice.extend(remediation("SIGNATURE_LEGACY"));
        }
    }

    let headers = headers_or_missing(headers);
    let missing = [
        (headers.strict_transport_security.is_none(), "HEADERS_HSTS_MISSING"),
        (headers.content_security_policy.is_none(), "HEADERS_CSP_MISSING"),
        (headers.x_frame_options.is_none(), "HEADERS_X_FRAME_OPTIONS_MISSING"),
        (headers.x_content_type_options.is_none(), "HEADERS_X_CONTENT_TYPE_OPTIONS_MISSING"),
    ];
    for (is_missing, code) in missing {
        if is_missing {
            advice.extend(remediation(code));
        }
    }

    advice
}

/// The most severe finding, if any.
pub fn worst_severity(vulnerabilities: &[Vulnerability]) -> Option<Severity> {
    vulnerabilities.iter().map(|v| v.severity).min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{KeyAlgorithm, PublicKeyInfo};
    use crate::core::scoring::tests::{all_headers, details};

    fn rsa(bits: u32) -> PublicKeyInfo {
        PublicKeyInfo::new(KeyAlgorithm::Rsa, Some(bits), "RSA")
    }

    #[test]
    fn expired_certificate_yields_exactly_one_critical() {
        let cert = details(-10, rsa(1024), "md5WithRSAEncryption");
        let found = identify_vulnerabilities(Some(&cert), None);

        let critical: Vec<_> = found.iter().filter(|v| v.severity == Severity::Critical).collect();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].kind, "Certificate Expired");
        assert!(!found.iter().any(|v| v.kind == "Certificate Expiring Soon"));
    }

    #[test]
    fn expiring_soon_carries_day_count() {
        let cert = details(12, rsa(4096), "sha256WithRSAEncryption");
        let found = identify_vulnerabilities(Some(&cert), Some(&all_headers()));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Warning);
        assert_eq!(found[0].description, "Certificate expires in 12 days");
    }

    #[test]
    fn thirty_days_left_is_not_a_warning() {
        let cert = details(30, rsa(4096), "sha256WithRSAEncryption");
        assert!(identify_vulnerabilities(Some(&cert), Some(&all_headers())).is_empty());
    }

    #[test]
    fn weak_key_is_high() {
        let cert = details(200, rsa(1024), "sha256WithRSAEncryption");
        let found = identify_vulnerabilities(Some(&cert), Some(&all_headers()));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::High);
        assert_eq!(found[0].kind, "Weak Key Size");
        assert_eq!(found[0].description, "RSA key of 1024 bits is below the 2048-bit minimum");
    }

    #[test]
    fn unknown_key_is_not_flagged_weak() {
        let cert = details(200, PublicKeyInfo::unknown(), "ED25519");
        assert!(identify_vulnerabilities(Some(&cert), Some(&all_headers())).is_empty());
    }

    #[test]
    fn missing_headers_by_severity() {
        let found = identify_vulnerabilities(None, Some(&SecurityHeaders::default()));
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].severity, found[0].kind.as_str()), (Severity::Medium, "Missing HSTS Header"));
        assert_eq!((found[1].severity, found[1].kind.as_str()), (Severity::Low, "Missing CSP Header"));
        assert_eq!(worst_severity(&found), Some(Severity::Medium));
    }

    #[test]
    fn absent_header_record_counts_as_missing() {
        assert_eq!(identify_vulnerabilities(None, None).len(), 2);
        assert_eq!(worst_severity(&[]), None);
    }

    #[test]
    fn healthy_site_needs_only_a_key_upgrade() {
        let cert = details(200, rsa(2048), "sha256WithRSAEncryption");
        assert_eq!(
            recommendations(Some(&cert), Some(&all_headers())),
            vec!["Consider upgrading to a 4096-bit RSA key or ECC (P-384)".to_string()]
        );
    }

    #[test]
    fn renewal_advice_starts_at_sixty_days() {
        let headers = all_headers();
        let at = |days| recommendations(Some(&details(days, rsa(4096), "sha256WithRSAEncryption")), Some(&headers));
        assert!(at(60).is_empty());
        assert_eq!(at(59), vec!["Schedule certificate renewal within the next 30 days".to_string()]);
        assert_eq!(
            at(-1),
            vec!["Renew the SSL certificate immediately and automate future renewals".to_string()]
        );
    }

    #[test]
    fn legacy_everything() {
        let cert = details(5, rsa(1024), "sha1WithRSAEncryption");
        let advice = recommendations(Some(&cert), None);
        assert_eq!(
            advice,
            vec![
                "Schedule certificate renewal within the next 30 days",
                "Replace the key with at least a 2048-bit RSA key or a P-256 ECC key",
                "Reissue the certificate with a SHA-256 or stronger signature",
                "Implement HSTS header with includeSubDomains",
                "Implement Content Security Policy",
                "Set X-Frame-Options to DENY or SAMEORIGIN",
                "Set X-Content-Type-Options to nosniff",
            ]
        );
    }
}
