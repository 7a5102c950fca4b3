// src/core/scanner/dns_scanner.rs

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::TokioAsyncResolver;
use tracing::{debug, info, warn};

use crate::core::error::SignalError;
use crate::core::knowledge_base::TXT_RECORD_TAGS;
use crate::core::models::DnsRecordType;

/// Builds the resolver used for every lookup of an analysis from the system
/// configuration, falling back to the built-in upstreams when it cannot be read.
/// One attempt per query: a failed lookup degrades its field instead of retrying.
pub fn build_resolver(timeout: Duration) -> TokioAsyncResolver {
    let (config, mut opts) = match read_system_conf() {
        Ok(system) => system,
        Err(e) => {
            warn!(error = %e, "System resolver configuration unavailable; using default upstreams.");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };
    opts.timeout = timeout;
    opts.attempts = 1;
    TokioAsyncResolver::tokio(config, opts)
}

fn is_no_records(e: &ResolveError) -> bool {
    matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

fn trim_dot(name: String) -> String {
    name.trim_end_matches('.').to_string()
}

/// Forward IPv4 lookup; the first address wins.
pub async fn lookup_ipv4(resolver: &TokioAsyncResolver, host: &str) -> Result<Option<Ipv4Addr>, SignalError> {
    debug!(host, "Resolving IPv4 address.");
    match resolver.ipv4_lookup(host).await {
        Ok(lookup) => Ok(lookup.iter().next().map(|a| a.0)),
        Err(e) if is_no_records(&e) => Ok(None),
        Err(e) => {
            warn!(host, error = %e, "IPv4 lookup failed.");
            Err(SignalError::collection("ipv4", e))
        }
    }
}

/// AAAA lookup. Hosts without IPv6 are normal and yield `Ok(None)`.
pub async fn lookup_ipv6(resolver: &TokioAsyncResolver, host: &str) -> Result<Option<Ipv6Addr>, SignalError> {
    debug!(host, "Resolving IPv6 address.");
    match resolver.ipv6_lookup(host).await {
        Ok(lookup) => Ok(lookup.iter().next().map(|aaaa| aaaa.0)),
        Err(e) if is_no_records(&e) => Ok(None),
        Err(e) => {
            warn!(host, error = %e, "IPv6 lookup failed.");
            Err(SignalError::collection("ipv6", e))
        }
    }
}

/// PTR lookup. A missing record, or one that only echoes the address, is `None`.
pub async fn lookup_reverse(resolver: &TokioAsyncResolver, ip: IpAddr) -> Result<Option<String>, SignalError> {
    debug!(%ip, "Looking up reverse DNS.");
    match resolver.reverse_lookup(ip).await {
        Ok(lookup) => Ok(lookup
            .iter()
            .next()
            .map(|ptr| trim_dot(ptr.to_string()).to_lowercase())
            .filter(|name| !name.is_empty() && *name != ip.to_string())),
        Err(e) if is_no_records(&e) => Ok(None),
        Err(e) => {
            warn!(%ip, error = %e, "Reverse DNS lookup failed.");
            Err(SignalError::collection("reverse_dns", e))
        }
    }
}

fn hickory_type(record_type: DnsRecordType) -> RecordType {
    match record_type {
        DnsRecordType::A => RecordType::A,
        DnsRecordType::AAAA => RecordType::AAAA,
        DnsRecordType::MX => RecordType::MX,
        DnsRecordType::TXT => RecordType::TXT,
        DnsRecordType::NS => RecordType::NS,
        DnsRecordType::CNAME => RecordType::CNAME,
        DnsRecordType::CAA => RecordType::CAA,
    }
}

/// Fetches one record set and renders each record as a display string.
/// Records of other types returned alongside (e.g. a CNAME chain) are skipped.
pub async fn lookup_records(
    resolver: &TokioAsyncResolver,
    host: &str,
    record_type: DnsRecordType,
) -> Result<Vec<String>, SignalError> {
    let wanted = hickory_type(record_type);
    debug!(host, record_type = %record_type, "Looking up DNS records.");

    match resolver.lookup(host, wanted).await {
        Ok(lookup) => {
            let records: Vec<String> = lookup
                .iter()
                .filter(|rdata| rdata.record_type() == wanted)
                .filter_map(render_record)
                .collect();
            info!(record_type = %record_type, count = records.len(), "DNS records found.");
            Ok(records)
        }
        Err(e) if is_no_records(&e) => Ok(Vec::new()),
        Err(e) => {
            warn!(host, record_type = %record_type, error = %e, "DNS lookup failed.");
            Err(SignalError::collection("dns_records", e))
        }
    }
}

fn render_record(rdata: &RData) -> Option<String> {
    match rdata {
        RData::A(a) => Some(a.to_string()),
        RData::AAAA(aaaa) => Some(aaaa.to_string()),
        RData::MX(mx) => Some(format!("{} {}", mx.preference(), trim_dot(mx.exchange().to_string()))),
        RData::TXT(txt) => {
            let text: String = txt
                .txt_data()
                .iter()
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect();
            Some(annotate_txt(&text))
        }
        RData::NS(ns) => Some(trim_dot(ns.to_string())),
        RData::CNAME(cname) => Some(trim_dot(cname.to_string())),
        RData::CAA(caa) => Some(caa.to_string()),
        _ => None,
    }
}

/// Prefixes well-known TXT records with a tag such as "[SPF] ".
pub fn annotate_txt(text: &str) -> String {
    match TXT_RECORD_TAGS.iter().find(|(prefix, _)| text.starts_with(prefix)) {
        Some((_, tag)) => format!("[{}] {}", tag, text),
        None => text.to_string(),
    }
}
