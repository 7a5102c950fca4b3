// src/core/scoring.rs

//! Posture score: fixed point allocations over certificate validity, key
//! strength, signature algorithm and security headers, clamped to 0..=100.

use crate::core::knowledge_base::key_standard;
use crate::core::models::{CertificateDetails, PublicKeyInfo, SecurityHeaders};

const VALID_POINTS: i32 = 20;
const MONTH_LEFT_POINTS: i32 = 5;
const QUARTER_LEFT_POINTS: i32 = 5;

const KEY_WEAK_POINTS: i32 = 0;
const KEY_BELOW_MINIMUM_POINTS: i32 = 8;
const KEY_BELOW_RECOMMENDED_POINTS: i32 = 15;
const KEY_RECOMMENDED_POINTS: i32 = 25;
const KEY_UNKNOWN_POINTS: i32 = 5;

const SIGNATURE_STRONG_POINTS: i32 = 10;
const SIGNATURE_UNRECOGNIZED_POINTS: i32 = 5;

const HSTS_POINTS: i32 = 15;
const CSP_POINTS: i32 = 10;
const XFO_POINTS: i32 = 5;
const XCTO_POINTS: i32 = 3;
const XXSS_POINTS: i32 = 2;

/// How a signature algorithm name reads once lower-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureStrength {
    /// Names SHA-256, SHA-384 or SHA-512.
    Strong,
    /// Names SHA-1 or MD5.
    Legacy,
    Unrecognized,
}

pub fn signature_strength(algorithm: &str) -> SignatureStrength {
    let name = algorithm.to_lowercase();
    if ["sha256", "sha384", "sha512"].iter().any(|h| name.contains(h)) {
        SignatureStrength::Strong
    } else if name.contains("sha1") || name.contains("md5") {
        SignatureStrength::Legacy
    } else {
        SignatureStrength::Unrecognized
    }
}

/// Where a key sits against its algorithm's size standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyGrade {
    BelowWeakThreshold,
    BelowMinimumSecure,
    BelowRecommended,
    Recommended,
}

/// `None` when the algorithm has no standard or the size is unknown.
pub fn key_grade(key: &PublicKeyInfo) -> Option<KeyGrade> {
    let standard = key_standard(key.algorithm())?;
    let bits = key.size()?;
    Some(if bits < standard.weak_threshold {
        KeyGrade::BelowWeakThreshold
    } else if bits < standard.minimum_secure {
        KeyGrade::BelowMinimumSecure
    } else if bits < standard.recommended {
        KeyGrade::BelowRecommended
    } else {
        KeyGrade::Recommended
    })
}

fn validity_points(cert: &CertificateDetails) -> i32 {
    if cert.is_expired {
        return 0;
    }
    let mut points = VALID_POINTS;
    if cert.days_until_expiry > 30 {
        points += MONTH_LEFT_POINTS;
    }
    if cert.days_until_expiry > 90 {
        points += QUARTER_LEFT_POINTS;
    }
    points
}

fn key_points(key: &PublicKeyInfo) -> i32 {
    match key_grade(key) {
        Some(KeyGrade::BelowWeakThreshold) => KEY_WEAK_POINTS,
        Some(KeyGrade::BelowMinimumSecure) => KEY_BELOW_MINIMUM_POINTS,
        Some(KeyGrade::BelowRecommended) => KEY_BELOW_RECOMMENDED_POINTS,
        Some(KeyGrade::Recommended) => KEY_RECOMMENDED_POINTS,
        None => KEY_UNKNOWN_POINTS,
    }
}

fn signature_points(algorithm: &str) -> i32 {
    match signature_strength(algorithm) {
        SignatureStrength::Strong => SIGNATURE_STRONG_POINTS,
        SignatureStrength::Unrecognized => SIGNATURE_UNRECOGNIZED_POINTS,
        SignatureStrength::Legacy => 0,
    }
}

fn header_points(headers: &SecurityHeaders) -> i32 {
    [
        (&headers.strict_transport_security, HSTS_POINTS),
        (&headers.content_security_policy, CSP_POINTS),
        (&headers.x_frame_options, XFO_POINTS),
        (&headers.x_content_type_options, XCTO_POINTS),
        (&headers.x_xss_protection, XXSS_POINTS),
    ]
    .iter()
    .filter(|(value, _)| value.is_some())
    .map(|(_, points)| points)
    .sum()
}

/// Scores the posture. Either input may be absent; absent parts contribute nothing.
pub fn score_posture(cert: Option<&CertificateDetails>, headers: Option<&SecurityHeaders>) -> u8 {
    let mut score = 0;

    if let Some(cert) = cert {
        score += validity_points(cert);
        score += key_points(&cert.public_key);
        score += signature_points(&cert.signature_algorithm);
    }
    if let Some(headers) = headers {
        score += header_points(headers);
    }

    score.clamp(0, 100) as u8
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::models::{DistinguishedName, KeyAlgorithm};
    use chrono::{Duration, TimeZone, Utc};

    pub(crate) fn details(days: i64, key: PublicKeyInfo, signature: &str) -> CertificateDetails {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let valid_to = now + Duration::days(days);
        CertificateDetails {
            subject: DistinguishedName::default(),
            issuer: DistinguishedName::default(),
            serial_number: "01".into(),
            valid_from: now - Duration::days(30),
            valid_to,
            days_until_expiry: days,
            is_expired: CertificateDetails::expired(days),
            is_expiring_soon: CertificateDetails::expiring_soon(days),
            signature_algorithm: signature.into(),
            public_key: key,
            san: vec![],
        }
    }

    pub(crate) fn all_headers() -> SecurityHeaders {
        SecurityHeaders {
            http_code: Some(200),
            strict_transport_security: Some("max-age=63072000; includeSubDomains".into()),
            content_security_policy: Some("default-src 'self'".into()),
            x_frame_options: Some("DENY".into()),
            x_content_type_options: Some("nosniff".into()),
            x_xss_protection: Some("0".into()),
            referrer_policy: None,
            error: None,
        }
    }

    fn rsa(bits: u32) -> PublicKeyInfo {
        PublicKeyInfo::new(KeyAlgorithm::Rsa, Some(bits), "RSA")
    }

    #[test]
    fn healthy_rsa_2048_site() {
        // 30 validity + 15 key + 10 signature + 35 headers.
        let cert = details(200, rsa(2048), "sha256WithRSAEncryption");
        assert_eq!(score_posture(Some(&cert), Some(&all_headers())), 90);
    }

    #[test]
    fn full_marks_need_a_recommended_key() {
        let cert = details(200, rsa(4096), "sha384WithRSAEncryption");
        assert_eq!(score_posture(Some(&cert), Some(&all_headers())), 100);
    }

    #[test]
    fn all_absent_scores_zero() {
        assert_eq!(score_posture(None, None), 0);
        assert_eq!(score_posture(None, Some(&SecurityHeaders::default())), 0);
    }

    #[test]
    fn validity_bands() {
        let key = || rsa(4096);
        assert_eq!(validity_points(&details(-1, key(), "")), 0);
        assert_eq!(validity_points(&details(0, key(), "")), 20);
        assert_eq!(validity_points(&details(30, key(), "")), 20);
        assert_eq!(validity_points(&details(31, key(), "")), 25);
        assert_eq!(validity_points(&details(90, key(), "")), 25);
        assert_eq!(validity_points(&details(91, key(), "")), 30);
    }

    #[test]
    fn key_bands() {
        assert_eq!(key_points(&rsa(1024)), 0);
        assert_eq!(key_points(&rsa(2047)), 0);
        assert_eq!(key_points(&rsa(2048)), 15);
        assert_eq!(key_points(&rsa(4096)), 25);
        assert_eq!(key_points(&PublicKeyInfo::new(KeyAlgorithm::Ec, Some(256), "ECC")), 15);
        assert_eq!(key_points(&PublicKeyInfo::new(KeyAlgorithm::Ec, Some(384), "ECC")), 25);
        assert_eq!(key_points(&PublicKeyInfo::new(KeyAlgorithm::Dsa, Some(1024), "DSA")), 0);
        assert_eq!(key_points(&PublicKeyInfo::new(KeyAlgorithm::Dsa, Some(3072), "DSA")), 25);
    }

    #[test]
    fn unknown_keys_get_flat_points() {
        assert_eq!(key_points(&PublicKeyInfo::unknown()), 5);
        assert_eq!(key_points(&PublicKeyInfo::new(KeyAlgorithm::Rsa, None, "RSA")), 5);
    }

    #[test]
    fn signature_names() {
        assert_eq!(signature_points("sha256WithRSAEncryption"), 10);
        assert_eq!(signature_points("ecdsa-with-SHA384"), 10);
        assert_eq!(signature_points("sha1WithRSAEncryption"), 0);
        assert_eq!(signature_points("md5WithRSAEncryption"), 0);
        assert_eq!(signature_points("ED25519"), 5);
    }

    #[test]
    fn empty_header_value_still_counts() {
        let headers = SecurityHeaders {
            strict_transport_security: Some(String::new()),
            ..SecurityHeaders::default()
        };
        assert_eq!(header_points(&headers), 15);
    }

    #[test]
    fn expired_weak_legacy_certificate_floors_at_zero() {
        let cert = details(-10, rsa(1024), "md5WithRSAEncryption");
        assert_eq!(score_posture(Some(&cert), Some(&SecurityHeaders::failed("timeout"))), 0);
    }
}
