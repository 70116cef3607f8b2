//! Application startup and lifecycle management.

use crate::config::{AssetsConfig, CompletionConfig, GenerationConfig};
use crate::handlers::{
    generate_chat_no_text, generate_text, health_check, metrics::metrics, readiness_check,
    save_snapshot, spa_service,
};
use crate::services::metrics::track_http_metrics;
use crate::services::providers::{ChatProvider, OpenAiConfig, OpenAiProvider};
use crate::services::{CompletionDb, LogStore};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, trace_layer};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub generation: GenerationConfig,
    pub provider: Arc<dyn ChatProvider>,
    /// `None` when persistence is disabled.
    pub store: Option<Arc<dyn LogStore>>,
}

/// API routes, probes and the SPA fallback.
pub fn build_router(state: AppState, assets: &AssetsConfig) -> Router {
    Router::new()
        .route("/generate-text", post(generate_text))
        .route("/generate-chat-no-text", post(generate_chat_no_text))
        .route("/save-snapshot", post(save_snapshot))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .fallback_service(spa_service(assets))
        .layer(from_fn(track_http_metrics))
        .layer(CorsLayer::permissive())
        .layer(trace_layer())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: CompletionConfig) -> Result<Self, AppError> {
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: config.provider.api_key.clone(),
            base_url: config.provider.base_url.clone(),
            model: config.provider.model.clone(),
            timeout: Duration::from_secs(config.provider.timeout_secs),
        })
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e.to_string())))?;

        if config.provider.api_key.is_empty() {
            tracing::warn!(
                base_url = %config.provider.base_url,
                "OPENAI_API_KEY is empty; requests are sent without credentials"
            );
        }
        tracing::info!(
            model = %config.provider.model,
            base_url = %config.provider.base_url,
            "Initialized chat provider"
        );

        let store: Option<Arc<dyn LogStore>> = if config.database.enabled {
            let db = CompletionDb::connect(&config.database.url, config.database.max_connections)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to connect to database: {}", e);
                    e
                })?;

            if config.database.auto_migrate {
                db.ensure_schema().await.map_err(|e| {
                    tracing::error!("Failed to initialize database schema: {}", e);
                    e
                })?;
            }
            Some(Arc::new(db))
        } else {
            tracing::info!("Persistence disabled; completions and snapshots are not stored");
            None
        };

        let state = AppState {
            generation: config.generation.clone(),
            provider: Arc::new(provider),
            store,
        };

        Self::build_with_state(&config, state).await
    }

    /// Bind a listener around prebuilt state (port 0 = random port for testing).
    pub async fn build_with_state(
        config: &CompletionConfig,
        state: AppState,
    ) -> Result<Self, AppError> {
        let address = format!("{}:{}", config.common.host, config.common.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        if !config.assets.index_path().is_file() {
            tracing::warn!(
                index = %config.assets.index_path().display(),
                "SPA index document not found; non-API paths will return 404"
            );
        }

        let router = build_router(state, &config.assets);

        tracing::info!("Completion service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }

    /// Run until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_graceful_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
    }
}
