// src/core/scanner/cdn_detector.rs

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::knowledge_base::{CDN_HEADERS, CDN_PROVIDERS, GENERIC_CDN_LABEL, GENERIC_CDN_MARKERS};

/// Matches one piece of text against the provider table.
///
/// The first provider with a matching marker wins. Text that matches no provider
/// but contains a generic marker ("cdn", "cache", "edge") yields "CDN Detected".
/// That fallback is a plain substring test, so an organization such as
/// "Edge Hill University" is reported as a CDN too.
pub fn analyze_cdn_pattern(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();

    let provider = CDN_PROVIDERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|marker| text.contains(marker)))
        .map(|(name, _)| *name);

    provider.or_else(|| {
        GENERIC_CDN_MARKERS
            .iter()
            .any(|marker| text.contains(marker))
            .then_some(GENERIC_CDN_LABEL)
    })
}

/// Names a CDN from response headers. Headers are expected with lower-cased names.
///
/// Presence of a known CDN header is enough; otherwise the `server` value is
/// matched like any other signal text.
pub fn detect_from_headers(headers: &BTreeMap<String, String>) -> Option<&'static str> {
    CDN_HEADERS
        .iter()
        .find(|(name, _)| headers.contains_key(*name))
        .map(|(_, label)| *label)
        .or_else(|| headers.get("server").and_then(|server| analyze_cdn_pattern(server)))
}

/// The five signals the detector fuses, in priority order.
#[derive(Debug, Default, Clone, Copy)]
pub struct CdnSignals<'a> {
    pub cname_targets: &'a [String],
    pub reverse_dns: Option<&'a str>,
    pub organization: Option<&'a str>,
    pub headers: Option<&'a BTreeMap<String, String>>,
    pub ns_targets: &'a [String],
}

/// Fuses every signal into one label. Each signal contributes at most one match;
/// matches are de-duplicated in first-seen order and joined with ", ".
/// `None` means no CDN was detected.
pub fn detect_cdn(signals: &CdnSignals<'_>) -> Option<String> {
    let mut found: Vec<&'static str> = Vec::new();

    let cname = signals.cname_targets.iter().map(|t| analyze_cdn_pattern(t));
    let reverse = signals.reverse_dns.map(analyze_cdn_pattern);
    let org = signals.organization.map(analyze_cdn_pattern);
    let header = signals.headers.map(detect_from_headers);
    let ns = signals.ns_targets.iter().map(|t| analyze_cdn_pattern(t));

    for label in cname
        .chain(reverse)
        .chain(org)
        .chain(header)
        .chain(ns)
        .flatten()
    {
        if !found.contains(&label) {
            found.push(label);
        }
    }

    if found.is_empty() {
        debug!("No CDN indicators found.");
        None
    } else {
        debug!(providers = ?found, "CDN indicators found.");
        Some(found.join(", "))
    }
}
