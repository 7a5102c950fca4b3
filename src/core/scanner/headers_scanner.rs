// src/core/scanner/headers_scanner.rs

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use tracing::{debug, error, info, warn};

use crate::core::error::SignalError;
use crate::core::models::{RawHeaders, SecurityHeaders};

/// Builds the client for the header fetch: no redirects, and certificate checks
/// only when `verify_tls` is set.
pub fn build_header_client(user_agent: &str, verify_tls: bool) -> reqwest::Result<reqwest::Client> {
    if !verify_tls {
        debug!("Header fetch will accept invalid certificates.");
    }
    reqwest::Client::builder()
        .user_agent(user_agent)
        .redirect(Policy::none())
        .danger_accept_invalid_certs(!verify_tls)
        .build()
}

/// Issues a single HEAD request and returns the response head as raw text.
pub async fn fetch_raw_headers(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<RawHeaders, SignalError> {
    info!(url, "Fetching response headers.");
    match client.head(url).timeout(timeout).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            info!(status, "Received HTTP response for headers scan.");
            Ok(RawHeaders {
                status,
                raw: render_head(status, response.headers()),
            })
        }
        Err(e) => {
            error!(url, error = %e, "HTTP request failed for headers scan.");
            Err(SignalError::collection("http_headers", e))
        }
    }
}

fn render_head(status: u16, headers: &HeaderMap) -> String {
    let mut raw = format!("HTTP/1.1 {}\r\n", status);
    for (name, value) in headers {
        let value = match value.to_str() {
            Ok(s) => s,
            Err(_) => {
                warn!(header_name = %name, "Header found but contained invalid UTF-8.");
                "[Invalid UTF-8]"
            }
        };
        raw.push_str(&format!("{}: {}\r\n", name, value));
    }
    raw
}

/// Splits a response head on CRLF, then each line on its first colon.
/// Names are lower-cased and both sides trimmed; a repeated header keeps its last value.
pub fn parse_headers(raw: &str) -> BTreeMap<String, String> {
    raw.split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_lowercase(), value.trim().to_string()))
        .collect()
}

/// Derives the security header record from a fetch outcome.
pub fn security_headers(fetch: &Result<RawHeaders, SignalError>) -> (SecurityHeaders, BTreeMap<String, String>) {
    match fetch {
        Ok(head) => {
            let headers = parse_headers(&head.raw);
            debug!(count = headers.len(), "Parsed response headers.");
            (SecurityHeaders::from_headers(head.status, &headers), headers)
        }
        Err(e) => (SecurityHeaders::failed(e.to_string()), BTreeMap::new()),
    }
}
