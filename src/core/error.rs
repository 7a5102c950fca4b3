// src/core/error.rs

use thiserror::Error;

/// Failures that abort an analysis. Without a leaf certificate there is nothing
/// to score, so these surface as an `AnalysisFailure` instead of a result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Transport or handshake failure. The underlying reason is kept verbatim.
    #[error("Unable to establish connection to {target} - {reason}")]
    Connection { target: String, reason: String },

    #[error("Failed to retrieve SSL certificate from {0}")]
    CertificateUnavailable(String),

    #[error("Failed to parse SSL certificate: {0}")]
    CertificateParse(String),
}

/// Failures that only degrade a single field of the report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("{signal} lookup failed: {reason}")]
    SignalCollection { signal: &'static str, reason: String },

    #[error("chain certificate #{index} could not be parsed: {reason}")]
    ChainEntryParse { index: usize, reason: String },
}

impl SignalError {
    pub fn collection(signal: &'static str, reason: impl ToString) -> Self {
        Self::SignalCollection { signal, reason: reason.to_string() }
    }
}
