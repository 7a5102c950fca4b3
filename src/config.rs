// src/config.rs

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::filter::LevelFilter;

use crate::core::models::DEFAULT_PORT;

/// TLS connect plus handshake budget, in seconds.
pub const HANDSHAKE_TIMEOUT_SECS: u64 = 10;
/// Header fetch budget, in seconds.
pub const HEADER_TIMEOUT_SECS: u64 = 5;
/// Per-query DNS budget, in seconds.
pub const DNS_TIMEOUT_SECS: u64 = 3;

pub const DEFAULT_USER_AGENT: &str = concat!("VanguardPosture/", env!("CARGO_PKG_VERSION"));

/// Verbosity of the stderr log layer.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Command-line options.
///
/// ```bash
/// vanguard-posture example.com
/// vanguard-posture https://example.com:8443/login --no-geo --compact
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "vanguard-posture",
    version,
    about = "Inspects a host's TLS certificate, chain and security headers and scores its posture."
)]
pub struct Cli {
    /// Hostname, IP address or URL to analyze
    pub target: String,

    /// Port used when the target does not carry one
    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// TLS connect and handshake timeout in seconds
    #[arg(long, default_value_t = HANDSHAKE_TIMEOUT_SECS)]
    pub handshake_timeout: u64,

    /// HTTP header fetch timeout in seconds
    #[arg(long, default_value_t = HEADER_TIMEOUT_SECS)]
    pub header_timeout: u64,

    /// DNS query timeout in seconds
    #[arg(long, default_value_t = DNS_TIMEOUT_SECS)]
    pub dns_timeout: u64,

    /// Skip DNS, reverse DNS, geolocation and CDN detection
    #[arg(long)]
    pub no_network_signals: bool,

    /// Skip the geolocation lookup
    #[arg(long)]
    pub no_geo: bool,

    /// Verify the certificate during the header fetch.
    ///
    /// Off by default so hosts with broken certificates still report their headers.
    #[arg(long)]
    pub verify_header_tls: bool,

    /// User-Agent for HTTP requests
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Log level for stderr output: off|error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Print the report as a single line of JSON
    #[arg(long)]
    pub compact: bool,
}

/// Library-level settings for one [`Analyzer`](crate::core::scanner::Analyzer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub handshake_timeout: Duration,
    pub header_timeout: Duration,
    pub dns_timeout: Duration,
    pub collect_network_signals: bool,
    pub geolocation: bool,
    pub verify_header_tls: bool,
    pub user_agent: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(HANDSHAKE_TIMEOUT_SECS),
            header_timeout: Duration::from_secs(HEADER_TIMEOUT_SECS),
            dns_timeout: Duration::from_secs(DNS_TIMEOUT_SECS),
            collect_network_signals: true,
            geolocation: true,
            verify_header_tls: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&Cli> for AnalyzerConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            handshake_timeout: Duration::from_secs(cli.handshake_timeout),
            header_timeout: Duration::from_secs(cli.header_timeout),
            dns_timeout: Duration::from_secs(cli.dns_timeout),
            collect_network_signals: !cli.no_network_signals,
            geolocation: !cli.no_geo,
            verify_header_tls: cli.verify_header_tls,
            user_agent: cli.user_agent.clone(),
        }
    }
}
