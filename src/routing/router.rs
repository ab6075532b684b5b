//! Destination lookup by request hostname.
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Exact hostname match only (port ignored); unmatched hosts go to the origin
//! - Authorities parsed once at startup

use std::str::FromStr;

use axum::http::uri::{Authority, InvalidUri};
use axum::http::{HeaderMap, Uri};

use crate::config::{Destination, RoutingConfig};
use crate::routing::matcher::{request_host, HostMatcher};

/// A resolved forwarding target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub destination: Destination,
    pub authority: Authority,
}

impl Target {
    pub fn label(&self) -> &'static str {
        match self.destination {
            Destination::Internal => "internal",
            Destination::Origin => "origin",
        }
    }
}

/// Compiled host routing table.
#[derive(Debug)]
pub struct HostRouter {
    hosts: Vec<(HostMatcher, Destination)>,
    origin: Target,
    internal: Option<Target>,
}

impl HostRouter {
    /// Build the router from configuration.
    pub fn from_config(config: &RoutingConfig) -> Result<Self, InvalidUri> {
        let origin = Target {
            destination: Destination::Origin,
            authority: Authority::from_str(&config.origin)?,
        };
        let internal = config
            .internal_service
            .as_deref()
            .map(Authority::from_str)
            .transpose()?
            .map(|authority| Target {
                destination: Destination::Internal,
                authority,
            });

        let mut hosts: Vec<(HostMatcher, Destination)> = config
            .hosts
            .iter()
            .map(|(host, dest)| (HostMatcher::new(host.as_str()), *dest))
            .collect();
        hosts.sort_by(|a, b| a.0.host().cmp(b.0.host()));

        Ok(Self {
            hosts,
            origin,
            internal,
        })
    }

    /// Resolve the forwarding target for a request.
    pub fn route(&self, headers: &HeaderMap, uri: &Uri) -> &Target {
        let host = request_host(headers, uri);
        let destination = self
            .hosts
            .iter()
            .find(|(matcher, _)| matcher.matches(host))
            .map(|(_, dest)| *dest)
            .unwrap_or(Destination::Origin);

        match destination {
            Destination::Internal => match &self.internal {
                Some(target) => target,
                None => {
                    tracing::warn!("Host routes to internal service but none is configured");
                    &self.origin
                }
            },
            Destination::Origin => &self.origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_for(host: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static(host));
        headers
    }

    fn route<'a>(router: &'a HostRouter, host: &'static str) -> &'a Target {
        router.route(&headers_for(host), &Uri::from_static("/"))
    }

    fn config() -> RoutingConfig {
        let mut config = RoutingConfig {
            origin: "127.0.0.1:3000".to_string(),
            internal_service: Some("127.0.0.1:4000".to_string()),
            ..Default::default()
        };
        config
            .hosts
            .insert("api.example.com".to_string(), Destination::Internal);
        config
            .hosts
            .insert("www.example.com".to_string(), Destination::Origin);
        config
    }

    #[test]
    fn test_routes_by_exact_host() {
        let router = HostRouter::from_config(&config()).unwrap();

        let target = route(&router, "api.example.com");
        assert_eq!(target.destination, Destination::Internal);
        assert_eq!(target.authority.as_str(), "127.0.0.1:4000");

        let target = route(&router, "API.EXAMPLE.COM");
        assert_eq!(target.destination, Destination::Internal);

        let target = route(&router, "www.example.com");
        assert_eq!(target.destination, Destination::Origin);
        assert_eq!(target.authority.as_str(), "127.0.0.1:3000");
    }

    #[test]
    fn test_unknown_host_goes_to_origin() {
        let router = HostRouter::from_config(&config()).unwrap();
        assert_eq!(route(&router, "sub.api.example.com").label(), "origin");
        assert_eq!(router.route(&HeaderMap::new(), &Uri::from_static("/")).label(), "origin");
    }

    #[test]
    fn test_host_with_port_still_matches() {
        let router = HostRouter::from_config(&config()).unwrap();
        assert_eq!(route(&router, "api.example.com:8080").label(), "internal");
        assert_eq!(route(&router, "www.example.com:443").label(), "origin");
    }

    #[test]
    fn test_uri_authority_used_without_host_header() {
        let router = HostRouter::from_config(&config()).unwrap();
        let uri = Uri::from_static("https://api.example.com/v1/items");
        assert_eq!(router.route(&HeaderMap::new(), &uri).label(), "internal");
    }

    #[test]
    fn test_missing_internal_falls_back_to_origin() {
        let mut config = config();
        config.internal_service = None;
        let router = HostRouter::from_config(&config).unwrap();
        assert_eq!(route(&router, "api.example.com").label(), "origin");
    }

    #[test]
    fn test_invalid_origin() {
        let mut config = config();
        config.origin = "bad host:port:x".to_string();
        assert!(HostRouter::from_config(&config).is_err());
    }
}
