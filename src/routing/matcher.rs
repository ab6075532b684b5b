//! Request classification.
//!
//! # Responsibilities
//! - Flag paths that look like PHP file access attempts
//! - Recognise the reporting API namespace
//! - Extract the request hostname (Host header, else URI authority) for routing
//!
//! # Design Decisions
//! - Pure, total functions: no I/O, never fail
//! - All comparisons are ASCII case-insensitive
//! - No regex to guarantee O(n) matching

use std::str::FromStr;

use axum::http::uri::Authority;
use axum::http::{header, HeaderMap, Uri};

const PHP_SUFFIX: &[u8] = b".php";

/// True iff the path contains `.php` followed by end-of-string, `/` or `?`.
pub fn is_php_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.windows(PHP_SUFFIX.len()).enumerate().any(|(i, window)| {
        window.eq_ignore_ascii_case(PHP_SUFFIX)
            && matches!(bytes.get(i + PHP_SUFFIX.len()), None | Some(b'/') | Some(b'?'))
    })
}

/// True iff the path starts with the reporting prefix.
pub fn is_reporting_path(path: &str, prefix: &str) -> bool {
    path.len() >= prefix.len()
        && path.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Hostname a request is addressed to, without any port.
///
/// Reads the Host header, falling back to the URI authority (HTTP/2 carries the
/// host there instead).
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(strip_port)
        .or_else(|| uri.host())
}

fn strip_port(host: &str) -> &str {
    match Authority::from_str(host) {
        // `Authority::host` borrows the parsed value; re-slice the input instead
        Ok(authority) => {
            let name = authority.host();
            host.find(name)
                .map(|start| &host[start..start + name.len()])
                .unwrap_or(host)
        }
        Err(_) => host,
    }
}

/// Matches the request hostname exactly, ignoring case and port.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }

    pub fn host(&self) -> &str {
        &self.expected_host
    }

    pub fn matches(&self, host: Option<&str>) -> bool {
        host.is_some_and(|h| h.eq_ignore_ascii_case(&self.expected_host))
    }
}
