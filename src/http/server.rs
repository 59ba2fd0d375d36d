//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router over the monitor and recorder
//! - Wire middleware (tracing, request timeout, CORS, credential gate)
//! - Serve until the shutdown broadcast fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::ApiKey;
use crate::http::{auth::require_api_key, handlers};
use crate::lifecycle::App;
use crate::probe::Monitor;
use crate::recorder::ResultRecorder;

/// State injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub recorder: Arc<ResultRecorder>,
    pub api_key: ApiKey,
    pub region: Arc<str>,
}

impl From<&App> for AppState {
    fn from(app: &App) -> Self {
        Self {
            monitor: app.monitor.clone(),
            recorder: app.recorder.clone(),
            api_key: app.api_key.clone(),
            region: Arc::from(app.config.runner.region.as_str()),
        }
    }
}

pub struct StatusServer {
    router: Router,
}

impl StatusServer {
    pub fn new(app: &App) -> Self {
        let timeout = Duration::from_secs(app.config.listener.request_timeout_secs);
        Self {
            router: Self::build_router(AppState::from(app), timeout),
        }
    }

    #[allow(deprecated)]
    fn build_router(state: AppState, timeout: Duration) -> Router {
        let auth = middleware::from_fn_with_state(state.clone(), require_api_key);

        Router::new()
            .route("/", get(handlers::root))
            .route("/ping", get(handlers::ping))
            .route("/services", get(handlers::services))
            .route(
                "/results",
                get(handlers::results).merge(post(handlers::submit).route_layer(auth.clone())),
            )
            .route("/summaries", get(handlers::summaries))
            .route(
                "/test",
                get(handlers::run_all)
                    .post(handlers::run_all)
                    .route_layer(auth.clone()),
            )
            .route(
                "/test/{service}",
                get(handlers::run_one)
                    .post(handlers::run_one)
                    .route_layer(auth),
            )
            .with_state(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
