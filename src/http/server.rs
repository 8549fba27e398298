//! HTTP server setup.
//!
//! # Responsibilities
//! - Create Axum Router with the demo handlers
//! - Wire up middleware (tracing, telemetry, timeout)
//! - Serve with peer addresses so events carry the remote host
//! - Stop accepting on the shutdown signal

use axum::{
    extract::Request,
    http::StatusCode,
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::layer::TelemetryLayer;

/// HTTP server wrapped by the telemetry layer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ServerConfig, telemetry: TelemetryLayer) -> Self {
        Self {
            router: Self::build_router(config, telemetry),
        }
    }

    /// Layer order, outermost first: trace, telemetry, timeout. Timed-out
    /// requests are still reported.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, telemetry: TelemetryLayer) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/echo", any(echo_handler))
            .route("/echo/{*path}", any(echo_handler))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(telemetry)
            .layer(TraceLayer::new_for_http())
    }

    /// The configured router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(Serialize)]
struct EchoResponse {
    method: String,
    path: String,
    query: Option<String>,
}

async fn echo_handler(request: Request) -> Json<EchoResponse> {
    Json(EchoResponse {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
    })
}
