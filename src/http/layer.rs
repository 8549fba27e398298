//! Request telemetry interceptor.
//!
//! # Responsibilities
//! - Build the shared telemetry client at startup
//! - Time the downstream service call for every HTTP request
//! - Send exactly one event per HTTP request, whatever the outcome
//! - Close the client at shutdown
//!
//! # Lifecycle
//! ```text
//! (no layer) ──start()──▶ Ready ──stop()──▶ Closed
//! ```
//!
//! # Design Decisions
//! - The event is sent from a drop guard, so errors, panics and cancelled
//!   futures all still produce one event
//! - Send failures are logged and swallowed; the inner response is returned as-is
//! - Non-HTTP requests bypass the layer entirely

use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Layer, Service};

use crate::config::TelemetryConfig;
use crate::http::request::{RequestRecord, RequestShape};
use crate::telemetry::{
    ConfigurationError, HostResolutionError, TelemetryClient, Transmission,
};

/// Event field names.
pub mod fields {
    pub const METHOD: &str = "method";
    pub const PATH: &str = "path";
    pub const QUERY: &str = "query";
    pub const USER: &str = "user";
    pub const HOST: &str = "host";
    pub const RESPONSE_TIME_NANOS: &str = "responseTimeNanos";
}

/// Tower layer that reports every HTTP request to the telemetry backend.
#[derive(Clone, Debug)]
pub struct TelemetryLayer {
    client: TelemetryClient,
}

impl TelemetryLayer {
    /// Build the client with the HTTP batch transmission and attach the
    /// local host name. Must run inside a tokio runtime.
    pub fn start(config: &TelemetryConfig) -> Result<Self, ConfigurationError> {
        Self::start_with(config, None, resolve_local_host)
    }

    /// Like [`TelemetryLayer::start`], with an optional custom transmission
    /// and host name resolver.
    pub fn start_with<F>(
        config: &TelemetryConfig,
        transmission: Option<Arc<dyn Transmission>>,
        resolve_host: F,
    ) -> Result<Self, ConfigurationError>
    where
        F: FnOnce() -> Result<String, HostResolutionError>,
    {
        let write_key = config
            .write_key
            .as_deref()
            .ok_or(ConfigurationError::Missing("write_key"))?;
        let dataset = config
            .dataset
            .as_deref()
            .ok_or(ConfigurationError::Missing("dataset"))?;

        let mut builder = TelemetryClient::builder(write_key, dataset)
            .api_host(config.api_host.as_str())
            .batch_size(config.batch_size)
            .flush_interval(Duration::from_millis(config.flush_interval_ms))
            .queue_capacity(config.queue_capacity)
            .request_timeout(Duration::from_secs(config.request_timeout_secs));
        if let Some(transmission) = transmission {
            builder = builder.transmission(transmission);
        }
        let mut client = builder.build()?;

        match resolve_host() {
            Ok(host) => client.add_static_field(config.host_field.as_str(), host),
            Err(e) => tracing::error!(
                error = %e,
                "Could not resolve local host name, events will not carry it"
            ),
        }

        tracing::info!(
            dataset = %client.dataset(),
            api_host = %config.api_host,
            "Request telemetry started"
        );
        Ok(Self { client })
    }

    pub fn client(&self) -> &TelemetryClient {
        &self.client
    }

    /// Flush pending events and release the client.
    ///
    /// Call after the server has stopped handing requests to the layer.
    pub async fn stop(self) {
        self.client.close().await;
        tracing::info!("Request telemetry stopped");
    }
}

impl<S> Layer<S> for TelemetryLayer {
    type Service = TelemetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TelemetryService {
            inner,
            client: self.client.clone(),
        }
    }
}

/// Service produced by [`TelemetryLayer`].
#[derive(Clone, Debug)]
pub struct TelemetryService<S> {
    inner: S,
    client: TelemetryClient,
}

impl<S, R> Service<R> for TelemetryService<S>
where
    S: Service<R>,
    S::Future: Send + 'static,
    R: RequestShape,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: R) -> Self::Future {
        let Some(record) = request.http_view() else {
            return Box::pin(self.inner.call(request));
        };

        let guard = DispatchGuard::arm(self.client.clone(), record);
        let response = self.inner.call(request);
        Box::pin(async move {
            let result = response.await;
            drop(guard);
            result
        })
    }
}

/// Sends the request's event when dropped.
struct DispatchGuard {
    client: TelemetryClient,
    record: Option<RequestRecord>,
    started: Instant,
}

impl DispatchGuard {
    fn arm(client: TelemetryClient, record: RequestRecord) -> Self {
        Self {
            client,
            record: Some(record),
            started: Instant::now(),
        }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        if let Some(record) = self.record.take() {
            dispatch(&self.client, record, elapsed);
        }
    }
}

fn dispatch(client: &TelemetryClient, record: RequestRecord, elapsed: Duration) {
    let RequestRecord {
        method,
        path,
        query,
        user,
        host,
    } = record;

    let mut event = client.new_event();
    event
        .add_field(fields::METHOD, method.as_str())
        .add_field(fields::PATH, path.as_str())
        .add_field(fields::QUERY, query);
    if let Some(user) = user {
        event.add_field(fields::USER, user);
    }
    event
        .add_field(fields::HOST, host)
        .add_field(fields::RESPONSE_TIME_NANOS, nanos(elapsed));

    if let Err(e) = event.send() {
        tracing::error!(
            error = %e,
            method = %method,
            path = %path,
            "Failed to send request telemetry event"
        );
    }
}

fn nanos(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX)
}

fn resolve_local_host() -> Result<String, HostResolutionError> {
    hostname::get()?
        .into_string()
        .map_err(|_| HostResolutionError::NotUtf8)
}
