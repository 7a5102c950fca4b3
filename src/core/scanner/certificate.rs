// src/core/scanner/certificate.rs

//! Decodes DER certificates into the normalized records of the report.
//! The leaf and every chain member go through the same decode path.

use chrono::{DateTime, Utc};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use x509_parser::extensions::GeneralName;
use x509_parser::objects::{oid2abbrev, oid2sn, oid_registry};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

use crate::core::error::{AnalysisError, SignalError};
use crate::core::knowledge_base::NAMED_CURVES;
use crate::core::models::{
    Certificate, CertificateDetails, ChainEntry, DistinguishedName, Fingerprints, KeyAlgorithm,
    PublicKeyInfo,
};

/// Marker that identifies a CA in the rendered basic-constraints extension.
const CA_MARKER: &str = "CA:TRUE";

/// Parses the leaf certificate. Any decode failure is fatal for the analysis.
pub fn parse_leaf(der: &[u8], now: DateTime<Utc>) -> Result<Certificate, AnalysisError> {
    let (_, x509) = parse_x509_certificate(der).map_err(|e| {
        warn!(error = %e, "Failed to parse leaf certificate");
        AnalysisError::CertificateParse(e.to_string())
    })?;

    let details = decode_details(&x509, now);
    info!(subject = %details.subject, issuer = %details.issuer, days_left = details.days_until_expiry, "Parsed leaf certificate.");

    Ok(Certificate {
        details,
        fingerprints: fingerprints(der),
    })
}

/// Parses the presented chain. Members that fail to decode are logged and dropped,
/// so the result may be shorter than the input.
pub fn parse_chain(chain: &[Vec<u8>], now: DateTime<Utc>) -> Vec<ChainEntry> {
    chain
        .iter()
        .enumerate()
        .filter_map(|(index, der)| match parse_chain_entry(index, der, now) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Dropping chain entry.");
                None
            }
        })
        .collect()
}

fn parse_chain_entry(index: usize, der: &[u8], now: DateTime<Utc>) -> Result<ChainEntry, SignalError> {
    let (_, x509) = parse_x509_certificate(der).map_err(|e| SignalError::ChainEntryParse {
        index,
        reason: e.to_string(),
    })?;

    let is_ca = basic_constraints_text(&x509)
        .map(|text| text.contains(CA_MARKER))
        .unwrap_or(false);
    let details = decode_details(&x509, now);
    debug!(index, subject = %details.subject, is_ca, "Parsed chain entry.");

    Ok(ChainEntry { details, is_ca })
}

fn decode_details(x509: &X509Certificate<'_>, now: DateTime<Utc>) -> CertificateDetails {
    let validity = x509.validity();
    let valid_from = asn1_time_to_chrono_utc(&validity.not_before);
    let valid_to = asn1_time_to_chrono_utc(&validity.not_after);
    let days_until_expiry = CertificateDetails::days_between(now, valid_to);

    CertificateDetails {
        subject: distinguished_name(x509.subject()),
        issuer: distinguished_name(x509.issuer()),
        serial_number: hex::encode_upper(x509.tbs_certificate.raw_serial()),
        valid_from,
        valid_to,
        days_until_expiry,
        is_expired: CertificateDetails::expired(days_until_expiry),
        is_expiring_soon: CertificateDetails::expiring_soon(days_until_expiry),
        signature_algorithm: signature_algorithm_name(x509),
        public_key: public_key_info(x509.public_key()),
        san: subject_alt_names(x509),
    }
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

fn distinguished_name(name: &X509Name<'_>) -> DistinguishedName {
    let mut dn = DistinguishedName::default();
    for attr in name.iter_attributes() {
        let key = oid2abbrev(attr.attr_type(), oid_registry())
            .map(str::to_string)
            .unwrap_or_else(|_| attr.attr_type().to_id_string());
        let value = attr.as_str().unwrap_or("[Unprintable]");
        dn.insert(&key, value);
    }
    dn
}

fn signature_algorithm_name(x509: &X509Certificate<'_>) -> String {
    let oid = &x509.signature_algorithm.algorithm;
    oid2sn(oid, oid_registry())
        .map(str::to_string)
        .unwrap_or_else(|_| oid.to_id_string())
}

/// Extracts algorithm family, size and a human-readable detail from the SPKI.
fn public_key_info(spki: &SubjectPublicKeyInfo<'_>) -> PublicKeyInfo {
    let parsed = match spki.parsed() {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(error = %e, "Public key could not be decoded.");
            return PublicKeyInfo::unknown();
        }
    };

    match parsed {
        PublicKey::RSA(rsa) => PublicKeyInfo::new(KeyAlgorithm::Rsa, bits(rsa.key_size()), "RSA"),
        PublicKey::EC(point) => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|params| params.as_oid().ok())
                .map(|oid| oid.to_id_string())
                .and_then(|id| NAMED_CURVES.iter().find(|(curve_oid, _, _)| *curve_oid == id));

            match curve {
                Some((_, name, size)) => {
                    PublicKeyInfo::new(KeyAlgorithm::Ec, Some(*size), format!("ECC ({})", name))
                }
                None => PublicKeyInfo::new(KeyAlgorithm::Ec, bits(point.key_size()), "ECC"),
            }
        }
        PublicKey::DSA(y) => PublicKeyInfo::new(KeyAlgorithm::Dsa, dsa_modulus_bits(y), "DSA"),
        _ => {
            let oid = spki.algorithm.algorithm.to_id_string();
            let detail = match oid.as_str() {
                "1.3.101.112" => "Ed25519".to_string(),
                "1.3.101.113" => "Ed448".to_string(),
                _ => oid,
            };
            PublicKeyInfo::new(KeyAlgorithm::Unknown, None, detail)
        }
    }
}

fn bits(size: usize) -> Option<u32> {
    u32::try_from(size).ok().filter(|b| *b > 0)
}

/// Approximates the DSA prime size from the public value `y`, which is a DER
/// INTEGER just below `p`. The bit length is rounded up to a multiple of 64.
fn dsa_modulus_bits(y: &[u8]) -> Option<u32> {
    let mut content = y;
    if let [0x02, len, rest @ ..] = y {
        content = if len & 0x80 == 0 {
            rest
        } else {
            let n = usize::from(len & 0x7f);
            rest.get(n..)?
        };
    }
    let first = content.iter().position(|b| *b != 0)?;
    let significant = &content[first..];
    let raw_bits = significant.len() * 8 - significant[0].leading_zeros() as usize;
    let rounded = raw_bits.div_ceil(64) * 64;
    bits(rounded)
}

fn subject_alt_names(x509: &X509Certificate<'_>) -> Vec<String> {
    let Ok(Some(ext)) = x509.subject_alternative_name() else {
        return Vec::new();
    };

    ext.value
        .general_names
        .iter()
        .filter_map(|name| match name {
            GeneralName::DNSName(dns) => Some(format!("DNS:{}", dns)),
            GeneralName::RFC822Name(email) => Some(format!("email:{}", email)),
            GeneralName::URI(uri) => Some(format!("URI:{}", uri)),
            GeneralName::IPAddress(bytes) => format_ip(bytes).map(|ip| format!("IP Address:{}", ip)),
            _ => None,
        })
        .collect()
}

fn format_ip(bytes: &[u8]) -> Option<String> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(std::net::Ipv4Addr::from(octets).to_string())
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(std::net::Ipv6Addr::from(octets).to_string())
        }
        _ => None,
    }
}

/// Renders the basic-constraints extension the way OpenSSL prints it,
/// e.g. "CA:TRUE, pathlen:0".
fn basic_constraints_text(x509: &X509Certificate<'_>) -> Option<String> {
    let ext = x509.basic_constraints().ok().flatten()?;
    let mut text = if ext.value.ca { "CA:TRUE".to_string() } else { "CA:FALSE".to_string() };
    if let Some(len) = ext.value.path_len_constraint {
        text.push_str(&format!(", pathlen:{}", len));
    }
    Some(text)
}

fn fingerprints(der: &[u8]) -> Fingerprints {
    Fingerprints {
        sha1: hex::encode(Sha1::digest(der)),
        sha256: hex::encode(Sha256::digest(der)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::SecurityLevel;
    use chrono::TimeZone;
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, date_time_ymd};

    fn self_signed(not_after_year: i32, is_ca: bool) -> Vec<u8> {
        let mut params = CertificateParams::new(vec!["example.com".to_string(), "www.example.com".to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, "example.com");
        params.distinguished_name.push(DnType::OrganizationName, "Example Org");
        params.not_before = date_time_ymd(2020, 1, 1);
        params.not_after = date_time_ymd(not_after_year, 1, 1);
        if is_ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
        }
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().to_vec()
    }

    #[test]
    fn leaf_fields_are_decoded() {
        let der = self_signed(2030, false);
        let now = Utc.with_ymd_and_hms(2029, 12, 22, 0, 0, 0).unwrap();
        let cert = parse_leaf(&der, now).unwrap();
        let details = &cert.details;

        assert_eq!(details.subject.get("CN"), Some("example.com"));
        assert_eq!(details.subject.get("O"), Some("Example Org"));
        assert_eq!(details.issuer, details.subject);
        assert_eq!(details.days_until_expiry, 10);
        assert!(!details.is_expired);
        assert!(details.is_expiring_soon);
        assert!(details.signature_algorithm.to_lowercase().contains("sha256"));
        assert!(details.san.contains(&"DNS:example.com".to_string()));
        assert!(details.san.contains(&"DNS:www.example.com".to_string()));
        assert!(!details.serial_number.is_empty());

        // rcgen defaults to ECDSA P-256.
        assert_eq!(details.public_key.algorithm(), KeyAlgorithm::Ec);
        assert_eq!(details.public_key.size(), Some(256));
        assert_eq!(details.public_key.type_detail(), "ECC (prime256v1)");
        assert_eq!(details.public_key.security_level(), SecurityLevel::Good);
        assert_eq!(details.public_key.rsa_equivalent(), Some(3072));

        assert_eq!(cert.fingerprints.sha1.len(), 40);
        assert_eq!(cert.fingerprints.sha256.len(), 64);
        assert_eq!(cert.fingerprints.sha256, hex::encode(Sha256::digest(&der)));
    }

    #[test]
    fn expired_leaf_has_negative_days() {
        let der = self_signed(2021, false);
        let now = Utc.with_ymd_and_hms(2021, 1, 11, 0, 0, 0).unwrap();
        let cert = parse_leaf(&der, now).unwrap();
        assert_eq!(cert.details.days_until_expiry, -10);
        assert!(cert.details.is_expired);
        assert!(!cert.details.is_expiring_soon);
    }

    #[test]
    fn garbage_leaf_is_a_parse_error() {
        let err = parse_leaf(b"not a certificate", Utc::now()).unwrap_err();
        assert!(matches!(err, AnalysisError::CertificateParse(_)));
    }

    #[test]
    fn chain_flags_ca_and_skips_broken_entries() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let chain = vec![self_signed(2030, true), b"\x30\x03\x02\x01\x00".to_vec(), self_signed(2030, false)];
        let parsed = parse_chain(&chain, now);

        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].is_ca);
        assert!(!parsed[1].is_ca);
        assert_eq!(parsed[0].details.subject.get("CN"), Some("example.com"));
    }

    #[test]
    fn dsa_size_from_public_value() {
        // INTEGER with a leading zero and a 2041-bit value.
        let mut y = vec![0x02, 0x82, 0x01, 0x00, 0x00, 0x01];
        y.extend(std::iter::repeat_n(0xff, 255));
        assert_eq!(dsa_modulus_bits(&y), Some(2048));

        assert_eq!(dsa_modulus_bits(&[0x02, 0x01, 0x00]), None);
    }
}
