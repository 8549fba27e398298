//! Request shape discrimination and per-request metadata.
//!
//! # Responsibilities
//! - Decide whether an inbound request is HTTP-shaped
//! - Extract method, path, query, principal and peer host
//!
//! # Design Decisions
//! - Absent query and principal are `None`, never empty strings
//! - The peer host comes from axum's `ConnectInfo`; without it the host is `"unknown"`

use axum::extract::ConnectInfo;
use axum::http::Request;
use std::net::SocketAddr;

/// Host recorded when the server does not expose peer addresses.
pub const UNKNOWN_HOST: &str = "unknown";

/// Authenticated identity attached to a request by an upstream auth layer.
///
/// Insert it into the request extensions; the telemetry layer reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Metadata captured for one request before the downstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub user: Option<String>,
    pub host: String,
}

impl RequestRecord {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let extensions = request.extensions();
        Self {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            user: extensions
                .get::<Principal>()
                .map(|principal| principal.name().to_string()),
            host: extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
                .unwrap_or_else(|| UNKNOWN_HOST.to_string()),
        }
    }
}

/// Request types the telemetry layer can wrap.
///
/// HTTP requests describe themselves; anything else keeps the default and is
/// passed through without an event.
pub trait RequestShape {
    fn http_view(&self) -> Option<RequestRecord> {
        None
    }
}

impl<B> RequestShape for Request<B> {
    fn http_view(&self) -> Option<RequestRecord> {
        Some(RequestRecord::from_request(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_record_from_full_request() {
        let mut request = Request::builder()
            .method("GET")
            .uri("/orders?id=5")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(Principal::new("alice"));
        request
            .extensions_mut()
            .insert(ConnectInfo("10.0.0.7:52100".parse::<SocketAddr>().unwrap()));

        let record = request.http_view().unwrap();
        assert_eq!(
            record,
            RequestRecord {
                method: "GET".into(),
                path: "/orders".into(),
                query: Some("id=5".into()),
                user: Some("alice".into()),
                host: "10.0.0.7".into(),
            }
        );
    }

    #[test]
    fn test_record_without_optional_parts() {
        let request = Request::builder()
            .method("POST")
            .uri("/login")
            .body(())
            .unwrap();

        let record = RequestRecord::from_request(&request);
        assert_eq!(record.query, None);
        assert_eq!(record.user, None);
        assert_eq!(record.host, UNKNOWN_HOST);
    }

    #[test]
    fn test_absolute_uri_keeps_path_only() {
        let request = Request::builder()
            .uri("http://example.com/a/b?x=1&y=2")
            .body(())
            .unwrap();

        let record = RequestRecord::from_request(&request);
        assert_eq!(record.method, "GET");
        assert_eq!(record.path, "/a/b");
        assert_eq!(record.query.as_deref(), Some("x=1&y=2"));
    }
}
