//! Access event model and edge metadata extraction.

use axum::http::{header, HeaderMap};
use serde::Serialize;
use uuid::Uuid;

/// Maximum stored user-agent length, in characters.
pub const MAX_USER_AGENT_CHARS: usize = 140;

pub const UNKNOWN_COUNTRY: &str = "ZZ";
pub const UNKNOWN_ASN: &str = "0";

pub const COUNTRY_HEADER: &str = "cf-ipcountry";
pub const REGION_HEADER: &str = "cf-region-code";
pub const ASN_HEADER: &str = "cf-asn";

/// Geo/network metadata supplied by the edge in front of the shim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMetadata {
    pub country: String,
    pub region: String,
    pub asn: String,
}

impl EdgeMetadata {
    /// Extract metadata from edge headers, defaulting anything missing or malformed.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let country = header_str(headers, COUNTRY_HEADER)
            .map(str::trim)
            .filter(|c| c.len() == 2 && c.bytes().all(|b| b.is_ascii_alphabetic()))
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

        let region = header_str(headers, REGION_HEADER)
            .map(|r| r.trim().to_string())
            .unwrap_or_default();

        let asn = header_str(headers, ASN_HEADER)
            .map(str::trim)
            .filter(|a| !a.is_empty() && a.bytes().all(|b| b.is_ascii_digit()))
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_ASN.to_string());

        Self { country, region, asn }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// One flagged PHP probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    pub path: String,
    pub country: String,
    pub region: String,
    pub user_agent: String,
    pub asn: String,
    /// Fresh per write; only used to spread events across sink partitions.
    pub event_id: Uuid,
}

impl AccessEvent {
    pub fn from_request(path: &str, headers: &HeaderMap) -> Self {
        let edge = EdgeMetadata::from_headers(headers);
        let user_agent = headers
            .get(header::USER_AGENT)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();

        Self {
            path: path.to_string(),
            country: edge.country,
            region: edge.region,
            user_agent: truncate_chars(&user_agent, MAX_USER_AGENT_CHARS),
            asn: edge.asn,
            event_id: Uuid::new_v4(),
        }
    }

    /// Lay the event out in the sink's blob/double/index shape.
    pub fn to_data_point(&self) -> DataPoint {
        DataPoint {
            blobs: vec![
                self.path.clone(),
                self.country.clone(),
                self.region.clone(),
                self.user_agent.clone(),
                self.asn.clone(),
            ],
            doubles: vec![1.0],
            indexes: vec![self.event_id.to_string()],
        }
    }
}

/// A record for the append-only sink. The timestamp is assigned server-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub blobs: Vec<String>,
    pub doubles: Vec<f64>,
    pub indexes: Vec<String>,
}

fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
