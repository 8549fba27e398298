//! Shared utilities for integration tests.

use futures_util::future::BoxFuture;
use request_telemetry::config::TelemetryConfig;
use request_telemetry::http::TelemetryLayer;
use request_telemetry::telemetry::{EventPayload, Transmission, TransportError};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Transmission that keeps events in memory, optionally refusing them.
#[derive(Default)]
pub struct RecordingTransmission {
    events: Mutex<Vec<EventPayload>>,
    attempts: AtomicUsize,
    fail: bool,
    closed: AtomicBool,
}

#[allow(dead_code)]
impl RecordingTransmission {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every enqueue fails with `QueueFull`.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<Map<String, Value>> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.data.clone())
            .collect()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Transmission for RecordingTransmission {
    fn enqueue(&self, event: EventPayload) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TransportError::QueueFull);
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
        })
    }
}

pub const TEST_HOST: &str = "test-host";

pub fn telemetry_config() -> TelemetryConfig {
    TelemetryConfig {
        write_key: Some("test-key".into()),
        dataset: Some("requests".into()),
        ..TelemetryConfig::default()
    }
}

/// Start a layer backed by `transmission`, with a fixed local host name.
pub fn start_layer(transmission: &Arc<RecordingTransmission>) -> TelemetryLayer {
    TelemetryLayer::start_with(
        &telemetry_config(),
        Some(transmission.clone() as Arc<dyn Transmission>),
        || Ok(TEST_HOST.to_string()),
    )
    .expect("telemetry layer should start")
}
