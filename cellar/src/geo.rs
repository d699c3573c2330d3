//! Client IP resolution and geolocation lookup.

use crate::config::GeoConfig;
use hyper::header::HeaderMap;
use serde::Deserialize;
use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Proxy headers checked for the client address, highest priority first.
const CLIENT_IP_HEADERS: &[&str] = &[
    "x-nf-client-connection-ip",
    "x-forwarded-for",
    "x-real-ip",
];

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Geolocation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geolocation lookup failed for {ip}: {message}")]
    LookupFailed { ip: String, message: String },

    #[error("Invalid geolocation URL: {0}")]
    InvalidUrl(String),
}

#[derive(Clone, Debug, Deserialize)]
struct GeoApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    city: String,
    #[serde(default, rename = "regionName")]
    region_name: String,
    #[serde(default)]
    country: String,
}

/// Resolved visitor location.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoLocation {
    pub city: String,
    pub region: String,
    pub country: String,
}

impl GeoLocation {
    /// "City, Region, Country" with empty parts dropped.
    pub fn display(&self) -> String {
        [&self.city, &self.region, &self.country]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Extracts the client IP from the proxy-header priority chain. Takes the
/// first hop of a comma-separated x-forwarded-for list.
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    for name in CLIENT_IP_HEADERS {
        let Some(value) = headers.get(*name).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let first_hop = value.split(',').next().unwrap_or(value).trim();
        if let Ok(ip) = first_hop.parse::<IpAddr>() {
            return Some(ip);
        }
    }
    None
}

/// Ranges that never resolve with a public geolocation service.
pub fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique-local
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                // fe80::/10 link-local
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

#[derive(Clone)]
pub struct GeoClient {
    client: reqwest::Client,
    base_url: Url,
}

impl GeoClient {
    pub fn new(config: &GeoConfig) -> Self {
        GeoClient {
            client: reqwest::Client::new(),
            base_url: config.api_url.clone(),
        }
    }

    /// Looks up a public IP. Callers are expected to have short-circuited
    /// private ranges via [`is_private`].
    pub async fn lookup(&self, ip: &IpAddr) -> Result<GeoLocation, GeoError> {
        let url = self
            .base_url
            .join(&format!("/json/{ip}"))
            .map_err(|e| GeoError::InvalidUrl(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<GeoApiResponse>()
            .await?;

        if response.status != "success" {
            return Err(GeoError::LookupFailed {
                ip: ip.to_string(),
                message: response.message.unwrap_or_default(),
            });
        }

        Ok(GeoLocation {
            city: response.city,
            region: response.region_name,
            country: response.country,
        })
    }
}
