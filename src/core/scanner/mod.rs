// src/core/scanner/mod.rs

pub mod cdn_detector;
pub mod certificate;
pub mod dns_scanner;
pub mod geo;
pub mod headers_scanner;
pub mod key_strength;
pub mod ssl_scanner;

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, Local, Utc};
use futures::future::join_all;
use strum::IntoEnumIterator;
use tracing::{debug, error, info, warn};

use crate::config::AnalyzerConfig;
use crate::core::analysis::{identify_vulnerabilities, recommendations, worst_severity};
use crate::core::error::{AnalysisError, SignalError};
use crate::core::models::{
    AnalysisFailure, AnalysisResult, DnsRecordType, NetworkSignals, PostureRating, Target,
};
use crate::core::probe::{LiveProbe, NetworkProbe};
use crate::core::scoring::score_posture;

use self::cdn_detector::{detect_cdn, CdnSignals};
use self::certificate::{parse_chain, parse_leaf};
use self::headers_scanner::security_headers;
use self::ssl_scanner::retrieve_certificates;

/// Runs analyses against targets. One analyzer can serve many concurrent calls;
/// it holds no per-analysis state.
pub struct Analyzer<P> {
    config: AnalyzerConfig,
    probe: P,
}

impl Analyzer<LiveProbe> {
    /// Analyzer wired to the real resolver, header fetch and geolocation service.
    pub fn live(config: AnalyzerConfig) -> reqwest::Result<Self> {
        let probe = LiveProbe::new(&config)?;
        Ok(Self::new(config, probe))
    }
}

impl<P: NetworkProbe> Analyzer<P> {
    pub fn new(config: AnalyzerConfig, probe: P) -> Self {
        Self { config, probe }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes `target` as of now.
    pub async fn analyze(&self, target: &Target) -> Result<AnalysisResult, AnalysisFailure> {
        self.analyze_at(target, Local::now()).await
    }

    /// Analyzes `target`, computing expiry figures against `now`.
    ///
    /// Only a missing or unparseable leaf certificate fails the analysis. Every
    /// other collaborator failure leaves its field absent.
    pub async fn analyze_at(&self, target: &Target, now: DateTime<Local>) -> Result<AnalysisResult, AnalysisFailure> {
        info!(%target, "Starting posture analysis.");
        self.run(target, now).await.map_err(|e| {
            error!(%target, error = %e, "Analysis failed.");
            AnalysisFailure::new(e, target, now)
        })
    }

    async fn run(&self, target: &Target, now: DateTime<Local>) -> Result<AnalysisResult, AnalysisError> {
        let presented = retrieve_certificates(&target.host, target.port, self.config.handshake_timeout).await?;

        let now_utc = now.with_timezone(&Utc);
        let certificate = parse_leaf(&presented.leaf, now_utc)?;
        let certificate_chain = parse_chain(&presented.chain, now_utc);

        let url = header_url(target);
        let (fetch, signals) = tokio::join!(
            self.probe.http_head(&url, self.config.header_timeout),
            self.collect_network_signals(target)
        );
        let (security_headers, raw_headers) = security_headers(&fetch);

        let network = signals.map(|mut signals| {
            signals.http_headers = raw_headers;
            let cdn = detect_cdn(&CdnSignals {
                cname_targets: signals.records(DnsRecordType::CNAME),
                reverse_dns: signals.reverse_dns.as_deref(),
                organization: signals.organization.as_deref(),
                headers: Some(&signals.http_headers),
                ns_targets: signals.records(DnsRecordType::NS),
            });
            signals.cdn = cdn;
            signals
        });

        let cert = Some(&certificate.details);
        let headers = Some(&security_headers);
        let security_score = score_posture(cert, headers);
        let vulnerabilities = identify_vulnerabilities(cert, headers);
        let recommendations = recommendations(cert, headers);
        let rating = PostureRating::from_score(security_score);

        info!(
            %target,
            security_score,
            %rating,
            findings = vulnerabilities.len(),
            worst = ?worst_severity(&vulnerabilities),
            "Analysis complete."
        );

        Ok(AnalysisResult {
            domain: target.host.clone(),
            port: target.port,
            timestamp: now,
            certificate,
            certificate_chain,
            security_headers,
            network,
            security_score,
            rating,
            vulnerabilities,
            recommendations,
        })
    }

    /// Gathers DNS, reverse DNS and location facts. `None` when disabled.
    /// Header-derived fields (`http_headers`, `cdn`) are filled in by the caller.
    async fn collect_network_signals(&self, target: &Target) -> Option<NetworkSignals> {
        if !self.config.collect_network_signals {
            debug!("Network signal collection disabled.");
            return None;
        }

        let host = target.host.as_str();
        let mut signals = NetworkSignals::default();

        match target.ip_literal() {
            Some(IpAddr::V4(ip)) => signals.ipv4 = Some(ip),
            Some(IpAddr::V6(ip)) => signals.ipv6 = Some(ip),
            None => {
                let (ipv4, ipv6, records) = tokio::join!(
                    self.probe.resolve_ipv4(host),
                    self.probe.resolve_ipv6(host),
                    self.collect_dns_records(host)
                );
                signals.ipv4 = or_absent(ipv4);
                signals.ipv6 = or_absent(ipv6);
                signals.dns_records = records;
            }
        }

        let Some(ip) = signals.ipv4.map(IpAddr::V4).or(signals.ipv6.map(IpAddr::V6)) else {
            warn!(host, "No address resolved; skipping reverse DNS and geolocation.");
            return Some(signals);
        };

        let geolocation = async {
            if self.config.geolocation {
                or_absent(self.probe.geo_lookup(ip).await)
            } else {
                None
            }
        };
        let (reverse_dns, location) = tokio::join!(self.probe.reverse_dns(ip), geolocation);
        signals.reverse_dns = or_absent(reverse_dns);

        let location = location.or_else(|| {
            let fallback = signals.reverse_dns.as_deref().and_then(geo::fallback_location);
            if fallback.is_some() {
                debug!("Location inferred from reverse DNS.");
            }
            fallback
        });
        signals.organization = location.as_ref().and_then(|l| l.organization.clone());
        signals.location = location;

        Some(signals)
    }

    /// Looks up every record type concurrently. Types that fail or come back
    /// empty are left out of the map.
    async fn collect_dns_records(&self, host: &str) -> BTreeMap<String, Vec<String>> {
        let lookups = DnsRecordType::iter().map(|record_type| async move {
            (record_type, self.probe.dns_records(host, record_type).await)
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(record_type, result)| {
                let records = or_absent(result);
                (!records.is_empty()).then(|| (record_type.to_string(), records))
            })
            .collect()
    }
}

/// Degrades a failed lookup to its empty value.
fn or_absent<T: Default>(result: Result<T, SignalError>) -> T {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "Signal unavailable.");
        T::default()
    })
}

/// URL for the header fetch; the port is omitted when it is the HTTPS default.
fn header_url(target: &Target) -> String {
    let host = if target.host.contains(':') {
        format!("[{}]", target.host)
    } else {
        target.host.clone()
    };
    if target.port == 443 {
        format!("https://{}", host)
    } else {
        format!("https://{}:{}", host, target.port)
    }
}
