//! Transparent forwarding to the resolved destination.

use axum::body::Body;
use axum::http::uri::{PathAndQuery, Scheme};
use axum::http::{HeaderValue, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::http::request::X_REQUEST_ID;
use crate::routing::Target;

pub type UpstreamClient = Client<HttpConnector, Body>;

/// Rewrite the request URI onto the target authority, keeping path and query.
pub fn upstream_uri(original: &Uri, target: &Target) -> Uri {
    let mut parts = original.clone().into_parts();
    parts.scheme = Some(Scheme::HTTP);
    parts.authority = Some(target.authority.clone());
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    Uri::from_parts(parts).unwrap_or_else(|_| original.clone())
}

/// Forward the request unchanged apart from its URI; headers (Host included) pass through.
pub async fn forward(
    client: &UpstreamClient,
    target: &Target,
    request: Request<Body>,
    request_id: &str,
) -> Response {
    let (mut parts, body) = request.into_parts();
    parts.uri = upstream_uri(&parts.uri, target);
    if let Ok(value) = HeaderValue::from_str(request_id) {
        parts.headers.insert(X_REQUEST_ID, value);
    }
    let upstream_request = Request::from_parts(parts, body);

    match client.request(upstream_request).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                destination = target.label(),
                authority = %target.authority,
                error = %e,
                "Upstream error"
            );
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
