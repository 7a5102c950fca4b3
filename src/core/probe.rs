// src/core/probe.rs

//! The network collaborators an analysis reads from, behind one trait so the
//! orchestration can run against live services or canned answers.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use tracing::debug;

use crate::config::AnalyzerConfig;
use crate::core::error::SignalError;
use crate::core::models::{DnsRecordType, GeoLocation, RawHeaders};
use crate::core::scanner::{dns_scanner, geo, headers_scanner};

/// Read-only lookups used to build the network signals and header record.
///
/// Every call is attempted once. `Ok(None)` and empty lists are normal outcomes;
/// `Err` degrades the corresponding report field.
#[allow(async_fn_in_trait)]
pub trait NetworkProbe {
    async fn resolve_ipv4(&self, host: &str) -> Result<Option<Ipv4Addr>, SignalError>;

    async fn resolve_ipv6(&self, host: &str) -> Result<Option<Ipv6Addr>, SignalError>;

    async fn reverse_dns(&self, ip: IpAddr) -> Result<Option<String>, SignalError>;

    async fn dns_records(&self, host: &str, record_type: DnsRecordType) -> Result<Vec<String>, SignalError>;

    async fn http_head(&self, url: &str, timeout: Duration) -> Result<RawHeaders, SignalError>;

    async fn geo_lookup(&self, ip: IpAddr) -> Result<Option<GeoLocation>, SignalError>;
}

/// Probe backed by the system resolver configuration (built-in upstreams when
/// none can be read) and real HTTP clients.
pub struct LiveProbe {
    resolver: TokioAsyncResolver,
    header_client: reqwest::Client,
    geo_client: reqwest::Client,
}

impl LiveProbe {
    pub fn new(config: &AnalyzerConfig) -> reqwest::Result<Self> {
        debug!(
            dns_timeout_secs = config.dns_timeout.as_secs(),
            verify_header_tls = config.verify_header_tls,
            "Building live network probe."
        );
        Ok(Self {
            resolver: dns_scanner::build_resolver(config.dns_timeout),
            header_client: headers_scanner::build_header_client(&config.user_agent, config.verify_header_tls)?,
            geo_client: reqwest::Client::builder()
                .user_agent(config.user_agent.as_str())
                .timeout(geo::GEO_TIMEOUT)
                .build()?,
        })
    }
}

impl NetworkProbe for LiveProbe {
    async fn resolve_ipv4(&self, host: &str) -> Result<Option<Ipv4Addr>, SignalError> {
        dns_scanner::lookup_ipv4(&self.resolver, host).await
    }

    async fn resolve_ipv6(&self, host: &str) -> Result<Option<Ipv6Addr>, SignalError> {
        dns_scanner::lookup_ipv6(&self.resolver, host).await
    }

    async fn reverse_dns(&self, ip: IpAddr) -> Result<Option<String>, SignalError> {
        dns_scanner::lookup_reverse(&self.resolver, ip).await
    }

    async fn dns_records(&self, host: &str, record_type: DnsRecordType) -> Result<Vec<String>, SignalError> {
        dns_scanner::lookup_records(&self.resolver, host, record_type).await
    }

    async fn http_head(&self, url: &str, timeout: Duration) -> Result<RawHeaders, SignalError> {
        headers_scanner::fetch_raw_headers(&self.header_client, url, timeout).await
    }

    async fn geo_lookup(&self, ip: IpAddr) -> Result<Option<GeoLocation>, SignalError> {
        geo::lookup_location(&self.geo_client, ip).await
    }
}
