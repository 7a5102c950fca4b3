// src/core/scanner/key_strength.rs

use crate::core::knowledge_base::ECC_RSA_EQUIVALENTS;
use crate::core::models::{KeyAlgorithm, SecurityLevel};

/// Classifies a public key by algorithm family and size in bits.
///
/// An unknown size or algorithm yields `SecurityLevel::Unknown`; this never fails.
pub fn classify_key(algorithm: KeyAlgorithm, bits: Option<u32>) -> SecurityLevel {
    let Some(bits) = bits else {
        return SecurityLevel::Unknown;
    };

    match algorithm {
        KeyAlgorithm::Rsa => match bits {
            0..1024 => SecurityLevel::CriticallyWeak,
            1024..2048 => SecurityLevel::WeakLegacy,
            2048..3072 => SecurityLevel::Adequate,
            3072..4096 => SecurityLevel::Good,
            _ => SecurityLevel::Excellent,
        },
        KeyAlgorithm::Ec => match bits {
            0..224 => SecurityLevel::Weak,
            224..256 => SecurityLevel::Legacy,
            256..384 => SecurityLevel::Good,
            384..521 => SecurityLevel::VeryGood,
            _ => SecurityLevel::Excellent,
        },
        KeyAlgorithm::Dsa => match bits {
            0..1024 => SecurityLevel::CriticallyWeak,
            1024..2048 => SecurityLevel::WeakLegacy,
            2048..3072 => SecurityLevel::Adequate,
            _ => SecurityLevel::Good,
        },
        KeyAlgorithm::Unknown => SecurityLevel::Unknown,
    }
}

/// RSA modulus size offering comparable strength to an EC key of `curve_bits`.
///
/// Picks the closest entry of the equivalence table; ties go to the smaller curve.
pub fn ecc_rsa_equivalent(curve_bits: u32) -> u32 {
    let mut best = ECC_RSA_EQUIVALENTS[0];
    for &entry in &ECC_RSA_EQUIVALENTS[1..] {
        if entry.0.abs_diff(curve_bits) < best.0.abs_diff(curve_bits) {
            best = entry;
        }
    }
    best.1
}
