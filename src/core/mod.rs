// src/core/mod.rs

/// Data structures shared by every stage: targets, certificates, signals and
/// the final report.
pub mod models;

/// Fatal and non-fatal error types.
pub mod error;

/// Immutable lookup tables and the catalogue of findings.
pub mod knowledge_base;

/// Certificate retrieval and parsing, signal collectors and the `Analyzer`.
pub mod scanner;

/// The network collaborator trait and its live implementation.
pub mod probe;

/// The 0 to 100 posture score and the key and signature grades behind it.
pub mod scoring;

/// Findings and remediation advice derived from certificate and header facts.
pub mod analysis;
