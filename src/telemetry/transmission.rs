//! Event delivery to the ingestion backend.
//!
//! # Responsibilities
//! - Accept events without blocking the caller
//! - Batch events by count or age
//! - POST batches to the ingestion API
//! - Flush whatever is pending on close
//!
//! # Design Decisions
//! - Bounded queue: when full, new events are dropped, never awaited
//! - No retries; a failed batch is logged and counted
//! - One background task per transmission, joined on close

use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use url::Url;

use crate::observability::metrics;
use crate::telemetry::error::{ConfigurationError, TransportError};
use crate::telemetry::event::EventPayload;

/// Header carrying the write key on batch requests.
pub const WRITE_KEY_HEADER: &str = "X-Honeycomb-Team";

/// Sink behind a [`TelemetryClient`](crate::telemetry::TelemetryClient).
///
/// `enqueue` is called from request paths and must not block.
pub trait Transmission: Send + Sync + 'static {
    fn enqueue(&self, event: EventPayload) -> Result<(), TransportError>;

    /// Stop accepting events and deliver what is pending.
    fn close(&self) -> BoxFuture<'_, ()>;
}

/// Settings for [`BatchTransmission`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub api_host: Url,
    pub write_key: String,
    pub dataset: String,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub queue_capacity: usize,
    pub request_timeout: Duration,
}

/// Batching HTTP transmission.
pub struct BatchTransmission {
    sender: mpsc::Sender<EventPayload>,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BatchTransmission {
    /// Spawn the background sender on the current tokio runtime.
    pub fn spawn(options: BatchOptions) -> Result<Self, ConfigurationError> {
        let runtime = Handle::try_current().map_err(|_| ConfigurationError::NoRuntime)?;
        let endpoint = batch_endpoint(&options.api_host, &options.dataset)?;

        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        let (sender, receiver) = mpsc::channel(options.queue_capacity.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let poster = BatchPoster {
            http,
            endpoint,
            write_key: options.write_key,
        };
        let worker = runtime.spawn(run_batches(
            receiver,
            shutdown_rx,
            poster,
            options.batch_size.max(1),
            options.flush_interval,
        ));

        tracing::debug!(
            dataset = %options.dataset,
            batch_size = options.batch_size,
            queue_capacity = options.queue_capacity,
            "Batch transmission started"
        );

        Ok(Self {
            sender,
            shutdown,
            closed: AtomicBool::new(false),
            worker: Mutex::new(Some(worker)),
        })
    }
}

impl Transmission for BatchTransmission {
    fn enqueue(&self, event: EventPayload) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            metrics::record_event_dropped(TransportError::Closed.reason());
            return Err(TransportError::Closed);
        }
        match self.sender.try_send(event) {
            Ok(()) => {
                metrics::record_event_enqueued();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                metrics::record_event_dropped(TransportError::QueueFull.reason());
                Err(TransportError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                metrics::record_event_dropped(TransportError::Closed.reason());
                Err(TransportError::Closed)
            }
        }
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            let _ = self.shutdown.send(true);

            let worker = self
                .worker
                .lock()
                .map(|mut guard| guard.take())
                .unwrap_or(None);
            if let Some(worker) = worker {
                if let Err(e) = worker.await {
                    tracing::error!(error = %e, "Telemetry batch worker terminated abnormally");
                }
            }
            tracing::debug!("Batch transmission closed");
        })
    }
}

/// `{api_host}/1/batch/{dataset}`, keeping any path prefix on the host and
/// percent-encoding the dataset as a single segment.
fn batch_endpoint(api_host: &Url, dataset: &str) -> Result<Url, ConfigurationError> {
    let mut endpoint = api_host.clone();
    endpoint
        .path_segments_mut()
        .map_err(|_| ConfigurationError::InvalidApiHost {
            host: api_host.to_string(),
            reason: "cannot be a base URL".to_string(),
        })?
        .pop_if_empty()
        .extend(["1", "batch", dataset]);
    Ok(endpoint)
}

struct BatchPoster {
    http: reqwest::Client,
    endpoint: Url,
    write_key: String,
}

impl BatchPoster {
    async fn flush(&self, batch: &mut Vec<EventPayload>) {
        if batch.is_empty() {
            return;
        }
        let size = batch.len();
        let start = Instant::now();

        let result = self
            .http
            .post(self.endpoint.clone())
            .header(WRITE_KEY_HEADER, &self.write_key)
            .json(&*batch)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                metrics::record_batch("ok", size, start);
                tracing::trace!(events = size, "Telemetry batch delivered");
            }
            Ok(response) => {
                metrics::record_batch("rejected", size, start);
                tracing::warn!(
                    status = %response.status(),
                    events = size,
                    "Telemetry backend rejected batch"
                );
            }
            Err(e) => {
                metrics::record_batch("error", size, start);
                tracing::warn!(error = %e, events = size, "Failed to deliver telemetry batch");
            }
        }
        batch.clear();
    }
}

async fn run_batches(
    mut receiver: mpsc::Receiver<EventPayload>,
    mut shutdown: watch::Receiver<bool>,
    poster: BatchPoster,
    batch_size: usize,
    flush_interval: Duration,
) {
    let mut batch: Vec<EventPayload> = Vec::with_capacity(batch_size);
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            received = receiver.recv() => match received {
                Some(event) => {
                    batch.push(event);
                    if batch.len() >= batch_size {
                        poster.flush(&mut batch).await;
                    }
                }
                None => break,
            },
            _ = ticker.tick() => {
                poster.flush(&mut batch).await;
            }
            _ = shutdown.changed() => {
                receiver.close();
                while let Ok(event) = receiver.try_recv() {
                    batch.push(event);
                    if batch.len() >= batch_size {
                        poster.flush(&mut batch).await;
                    }
                }
                break;
            }
        }
    }

    poster.flush(&mut batch).await;
}
