//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address recorded)
//!     → server.rs (Axum setup)
//!     → layer.rs (start timer, call handlers, send one event)
//!         → request.rs (is it HTTP? method, path, query, principal, host)
//!     → Send response to client
//! ```

pub mod layer;
pub mod request;
pub mod server;

pub use layer::{TelemetryLayer, TelemetryService};
pub use request::{Principal, RequestRecord, RequestShape};
pub use server::HttpServer;
