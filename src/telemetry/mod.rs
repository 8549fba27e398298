//! Event-ingestion client.
//!
//! # Data Flow
//! ```text
//! TelemetryClient (write key, dataset, static fields)
//!     → new_event() → Event (static fields + per-request fields)
//!     → Event::send() → Transmission::enqueue (never blocks)
//!     → BatchTransmission worker → POST {api_host}/1/batch/{dataset}
//! ```
//!
//! # Design Decisions
//! - The client is built once and shared; it is not mutated per event
//! - Sending only enqueues; delivery failures never reach the sender
//! - Transmission is a trait so tests and other backends can plug in

pub mod client;
pub mod error;
pub mod event;
pub mod transmission;

pub use client::{ClientBuilder, TelemetryClient};
pub use error::{ConfigurationError, HostResolutionError, TransportError};
pub use event::{Event, EventPayload};
pub use transmission::{BatchOptions, BatchTransmission, Transmission};
