// src/lib.rs

//! TLS certificate and security posture analysis.
//!
//! [`core::scanner::Analyzer`] retrieves a host's certificate chain, collects
//! DNS, header and location signals, and scores the result.

pub mod config;
pub mod core;
pub mod logging;

pub use crate::config::AnalyzerConfig;
pub use crate::core::models::{AnalysisFailure, AnalysisResult, Target};
pub use crate::core::scanner::Analyzer;
