//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Start telemetry → Bind listener → Serve
//!
//! Shutdown:
//!     Signal received → Stop accepting → Drain requests → Stop telemetry (flush) → Exit
//! ```
//!
//! # Design Decisions
//! - Telemetry starts before the listener and stops after it, so every
//!   served request is covered

pub mod signals;

pub use signals::shutdown_signal;
