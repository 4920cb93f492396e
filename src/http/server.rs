//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the axum router whose only handler feeds the pipeline
//! - Wire up tower layers (tracing, timeout, request ID)
//! - Serve until shutdown, swapping in new pipelines on config reload

use arc_swap::ArcSwap;
use axum::{extract::State, http::StatusCode, Router};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, ConfigError};
use crate::http::{PlainResponseFactory, Request, Response, ResponseFactory};
use crate::lifecycle::{assemble_pipeline, shutdown_signal};
use crate::observability::metrics;
use crate::pipeline::Pipeline;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<ArcSwap<Pipeline>>,
}

/// HTTP host for the request pipeline.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    pipeline: Arc<ArcSwap<Pipeline>>,
}

impl HttpServer {
    /// Validate the configuration and assemble the server.
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let pipeline = Arc::new(ArcSwap::from_pointee(assemble_pipeline(&config)?));
        let state = AppState {
            pipeline: pipeline.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            pipeline,
        })
    }

    /// Build the axum router with all middleware layers.
    ///
    /// The request timeout is not a deadline on the pipeline. Stages and
    /// actions run synchronously inside a single poll of the handler, so a
    /// traversal cannot be interrupted: it holds its worker thread until it
    /// returns, and its own response is sent even if it overran.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .fallback(pipeline_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The axum router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The pipeline currently serving requests.
    pub fn pipeline(&self) -> Arc<Pipeline> {
        self.pipeline.load_full()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` replace the pipeline; listener and
    /// timeout settings only take effect on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            stages = ?self.pipeline.load().stage_names(),
            "HTTP server starting"
        );

        let swap = self.pipeline.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match assemble_pipeline(&config) {
                    Ok(pipeline) => {
                        swap.store(Arc::new(pipeline));
                        tracing::info!(
                            actions = config.actions.len(),
                            routes = config.routes.len(),
                            "Pipeline reloaded"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reload rejected, keeping current pipeline");
                    }
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Hands every request to the current pipeline.
async fn pipeline_handler(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let pipeline = state.pipeline.load_full();

    let response = match pipeline.handle(request) {
        Ok(response) => response,
        Err(e) => {
            // Only reachable when the stage list has no error boundary.
            tracing::error!(kind = e.kind(), error = %e, "Failure escaped the pipeline");
            PlainResponseFactory.create_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
