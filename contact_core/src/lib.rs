//! Core library for the contact form service: validation, sanitization,
//! rate limiting, delivery with native-form fallback, and the HTTP routes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod store;
pub mod submission;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use metrics::{MetricsSnapshot, SubmissionMetrics};
pub use middleware::cors::cors_layer_from_config;
pub use rate_limit::{RateLimiter, RATE_LIMIT_STORAGE_KEY};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use submission::{
    Delivery, FallbackSubmitter, HtmlFormFallback, HttpTransport, InFlightRegistry,
    SubmissionOrchestrator, SubmissionState, SubmitError, Transport,
};
pub use validation::{ContactFields, NewsletterFields, ValidationResult};

use axum::Router;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn KeyValueStore>,
    /// Action URL of the native form fallback.
    pub fallback_action: String,
    pub metrics: SubmissionMetrics,
    /// Clients with a submission running, across requests.
    pub in_flight: InFlightRegistry,
}

impl AppState {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
        fallback_action: impl Into<String>,
    ) -> Self {
        Self {
            app_name: "Contact Form Service".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            transport,
            store,
            fallback_action: fallback_action.into(),
            metrics: SubmissionMetrics::new(),
            in_flight: InFlightRegistry::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.form)?;

        let store: Arc<dyn KeyValueStore> = match config.rate_limit_storage_path() {
            Some(path) => {
                info!("Rate limit records persisted to {}", path.display());
                Arc::new(JsonFileStore::new(path))
            }
            None => {
                info!("Rate limit records kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(Arc::new(transport), store, config.form.endpoint.clone()))
    }

    /// A fresh orchestrator for one request from `client`. Each client gets
    /// its own rate-limit record.
    pub fn orchestrator_for(
        &self,
        client: IpAddr,
        fallback: Arc<dyn FallbackSubmitter>,
    ) -> SubmissionOrchestrator {
        let limiter = RateLimiter::with_key(
            self.store.clone(),
            format!("{}:{}", RATE_LIMIT_STORAGE_KEY, client),
        );

        SubmissionOrchestrator::new(
            self.transport.clone(),
            fallback,
            limiter,
            self.fallback_action.clone(),
        )
        .with_metrics(self.metrics.clone())
    }
}

pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(cors_layer_from_config(&config.cors))
        .layer(middleware::logging::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let app = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
