//! Application startup and lifecycle management.

use crate::config::RelayConfig;
use crate::domain::DateResolver;
use crate::handlers;
use crate::services::providers::openai::{OpenAiChatProvider, OpenAiConfig};
use crate::services::providers::ChatProvider;
use crate::services::{FixedFilters, QueryProfile, RecordSource, RelevanceAnalyzer, SecopClient};
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use service_core::error::{AppError, ErrorResponse};
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use service_core::observability::init_metrics;
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Shared application state. Everything in it is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub dates: DateResolver,
    pub profile: Arc<QueryProfile>,
    pub records: Arc<dyn RecordSource>,
    pub analyzer: RelevanceAnalyzer,
}

impl AppState {
    pub fn new(
        dates: DateResolver,
        profile: QueryProfile,
        records: Arc<dyn RecordSource>,
        analyzer: RelevanceAnalyzer,
    ) -> Self {
        Self {
            dates,
            profile: Arc::new(profile),
            records,
            analyzer,
        }
    }

    /// Wire the production clients from configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self, AppError> {
        let dates = DateResolver::new(config.relay.utc_offset_hours)?;
        let profile = QueryProfile::new(FixedFilters::from(&config.secop));

        let secop = SecopClient::new((&config.secop).into()).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to build SECOP client: {}", e))
        })?;
        tracing::info!(
            dataset_url = %secop.dataset_url(),
            timeout_secs = config.secop.timeout_secs,
            "Initialized SECOP client"
        );

        let provider: Arc<dyn ChatProvider> = Arc::new(
            OpenAiChatProvider::new(OpenAiConfig::from(&config.openai)).map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build chat provider: {}", e))
            })?,
        );
        tracing::info!(
            model = %provider.model(),
            timeout_secs = config.openai.timeout_secs,
            "Initialized chat completion provider"
        );

        Ok(Self::new(
            dates,
            profile,
            Arc::new(secop),
            RelevanceAnalyzer::new(provider, &config.relay.firm_name),
        ))
    }
}

/// Convert a handler panic into the generic processing error.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %message, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Error processing request".to_string(),
            details: None,
        }),
    )
        .into_response()
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/raw", get(handlers::raw_contracts))
        .route("/filtered", get(handlers::filtered_contracts))
        .route("/analyzed", get(handlers::analyzed_contracts))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(&config)?;
        Self::with_state(&config, state).await
    }

    /// Bind the listener and wire `state` into the router.
    pub async fn with_state(config: &RelayConfig, state: AppState) -> Result<Self, AppError> {
        init_metrics();

        // Port 0 = random port for testing
        let addr = config.common.listen_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("SECOP relay listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}
