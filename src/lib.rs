//! HTTP request telemetry.
//!
//! A tower layer that times every HTTP request passing through it and sends
//! one structured event per request (method, path, query, user, host,
//! response time) to an event-ingestion backend, without holding up or
//! altering the response.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod telemetry;

pub use config::AppConfig;
pub use http::{HttpServer, Principal, TelemetryLayer};
pub use telemetry::TelemetryClient;
