//! Client handle for the event-ingestion backend.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::telemetry::error::ConfigurationError;
use crate::telemetry::event::Event;
use crate::telemetry::transmission::{BatchOptions, BatchTransmission, Transmission};

pub const DEFAULT_API_HOST: &str = "https://api.honeycomb.io";

/// Shared handle used to create and send events.
///
/// Cloning is cheap. Static fields are copied onto every event created
/// through [`TelemetryClient::new_event`].
#[derive(Clone)]
pub struct TelemetryClient {
    inner: Arc<ClientInner>,
}

#[derive(Clone)]
struct ClientInner {
    dataset: String,
    static_fields: Map<String, Value>,
    transmission: Arc<dyn Transmission>,
}

impl TelemetryClient {
    pub fn builder(write_key: impl Into<String>, dataset: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(write_key.into(), dataset.into())
    }

    /// Attach a field included on every subsequent event.
    ///
    /// Meant for startup, before the handle is shared. If other clones
    /// already exist, only this handle sees the new field.
    pub fn add_static_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        Arc::make_mut(&mut self.inner)
            .static_fields
            .insert(key.into(), value.into());
    }

    pub fn new_event(&self) -> Event {
        Event::new(&self.inner.static_fields, self.inner.transmission.clone())
    }

    pub fn dataset(&self) -> &str {
        &self.inner.dataset
    }

    pub fn static_fields(&self) -> &Map<String, Value> {
        &self.inner.static_fields
    }

    /// Flush pending events and release the transmission.
    pub async fn close(&self) {
        self.inner.transmission.close().await;
    }
}

impl std::fmt::Debug for TelemetryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryClient")
            .field("dataset", &self.inner.dataset)
            .field("static_fields", &self.inner.static_fields)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TelemetryClient`].
pub struct ClientBuilder {
    write_key: String,
    dataset: String,
    api_host: String,
    batch_size: usize,
    flush_interval: Duration,
    queue_capacity: usize,
    request_timeout: Duration,
    transmission: Option<Arc<dyn Transmission>>,
}

impl ClientBuilder {
    fn new(write_key: String, dataset: String) -> Self {
        Self {
            write_key,
            dataset,
            api_host: DEFAULT_API_HOST.to_string(),
            batch_size: 50,
            flush_interval: Duration::from_millis(100),
            queue_capacity: 10_000,
            request_timeout: Duration::from_secs(10),
            transmission: None,
        }
    }

    pub fn api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = api_host.into();
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn flush_interval(mut self, flush_interval: Duration) -> Self {
        self.flush_interval = flush_interval;
        self
    }

    pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Use a custom transmission instead of the HTTP batch sender.
    pub fn transmission(mut self, transmission: Arc<dyn Transmission>) -> Self {
        self.transmission = Some(transmission);
        self
    }

    /// Build the client.
    ///
    /// Spawns the batch sender on the current tokio runtime unless a
    /// transmission was supplied.
    pub fn build(self) -> Result<TelemetryClient, ConfigurationError> {
        if self.write_key.trim().is_empty() {
            return Err(ConfigurationError::Missing("write_key"));
        }
        if self.dataset.trim().is_empty() {
            return Err(ConfigurationError::Missing("dataset"));
        }

        let transmission = match self.transmission {
            Some(transmission) => transmission,
            None => {
                let api_host = parse_api_host(&self.api_host)?;
                Arc::new(BatchTransmission::spawn(BatchOptions {
                    api_host,
                    write_key: self.write_key,
                    dataset: self.dataset.clone(),
                    batch_size: self.batch_size,
                    flush_interval: self.flush_interval,
                    queue_capacity: self.queue_capacity,
                    request_timeout: self.request_timeout,
                })?)
            }
        };

        Ok(TelemetryClient {
            inner: Arc::new(ClientInner {
                dataset: self.dataset,
                static_fields: Map::new(),
                transmission,
            }),
        })
    }
}

fn parse_api_host(raw: &str) -> Result<Url, ConfigurationError> {
    let url = Url::parse(raw).map_err(|e| ConfigurationError::InvalidApiHost {
        host: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigurationError::InvalidApiHost {
            host: raw.to_string(),
            reason: "expected an http(s) base URL".to_string(),
        });
    }
    Ok(url)
}
