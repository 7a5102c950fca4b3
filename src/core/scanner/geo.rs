// src/core/scanner/geo.rs

use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::error::SignalError;
use crate::core::knowledge_base::{COUNTRY_HINTS, GLOBAL_ORGANIZATIONS, ORGANIZATION_PATTERNS};
use crate::core::models::GeoLocation;

const GEO_ENDPOINT: &str = "https://ipapi.co";
pub const GEO_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    error: Option<serde_json::Value>,
    country_name: Option<String>,
    region: Option<String>,
    city: Option<String>,
    org: Option<String>,
    timezone: Option<String>,
}

/// Looks the address up at ipapi.co. An error body means "unavailable", not failure.
pub async fn lookup_location(client: &reqwest::Client, ip: IpAddr) -> Result<Option<GeoLocation>, SignalError> {
    let url = format!("{}/{}/json/", GEO_ENDPOINT, ip);
    debug!(%ip, "Requesting geolocation.");

    let body = client
        .get(&url)
        .timeout(GEO_TIMEOUT)
        .send()
        .await
        .map_err(|e| {
            warn!(%ip, error = %e, "Geolocation request failed.");
            SignalError::collection("geolocation", e)
        })?
        .text()
        .await
        .map_err(|e| SignalError::collection("geolocation", e))?;

    parse_location(&body)
}

fn parse_location(body: &str) -> Result<Option<GeoLocation>, SignalError> {
    let response: IpApiResponse =
        serde_json::from_str(body).map_err(|e| SignalError::collection("geolocation", e))?;

    if response.error.is_some() {
        info!("Geolocation service has no data for this address.");
        return Ok(None);
    }

    Ok(Some(GeoLocation {
        country: response.country_name,
        region: response.region,
        city: response.city,
        organization: response.org,
        timezone: response.timezone,
    }))
}

/// Infers the hosting organization from a reverse-DNS name.
pub fn organization_from_reverse_dns(reverse_dns: &str) -> Option<&'static str> {
    let name = reverse_dns.to_lowercase();
    ORGANIZATION_PATTERNS
        .iter()
        .find(|(pattern, _)| name.contains(pattern))
        .map(|(_, org)| *org)
}

/// Coarse location used when the geolocation service is unavailable.
pub fn fallback_location(reverse_dns: &str) -> Option<GeoLocation> {
    let organization = organization_from_reverse_dns(reverse_dns);

    if let Some((org, country, region)) = organization
        .and_then(|org| GLOBAL_ORGANIZATIONS.iter().find(|(name, _, _)| *name == org))
    {
        return Some(GeoLocation {
            country: Some(country.to_string()),
            region: Some(region.to_string()),
            city: Some("Multiple Locations".to_string()),
            organization: Some(org.to_string()),
            timezone: Some("UTC".to_string()),
        });
    }

    let name = reverse_dns.to_lowercase();
    let hint = COUNTRY_HINTS.iter().find(|(suffix, _, _, _)| name.contains(suffix));
    match (organization, hint) {
        (None, None) => None,
        (org, hint) => Some(GeoLocation {
            country: hint.map(|(_, country, _, _)| country.to_string()),
            region: None,
            city: hint.map(|(_, _, city, _)| city.to_string()),
            organization: org.map(str::to_string),
            timezone: hint.map(|(_, _, _, tz)| tz.to_string()),
        }),
    }
}
