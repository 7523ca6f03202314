use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use overwatch_assessor::RiskAssessor;
use overwatch_common::GatewayConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    middleware::{get_tracing_layer, logging_middleware},
    openapi::openapi_json,
    routes,
    types::HealthResponse,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub assessor: Arc<RiskAssessor>,
}

impl AppState {
    pub fn new(assessor: RiskAssessor) -> Self {
        Self {
            assessor: Arc::new(assessor),
        }
    }
}

/// Build the gateway router around `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/assess_risk", post(routes::assess::assess_risk))
        .route("/health", get(health_check))
        .route("/api-doc/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(logging_middleware))
        .layer(get_tracing_layer())
        .with_state(state)
}

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Gateway is running", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

pub struct OverwatchServer {
    address: String,
    state: AppState,
}

impl OverwatchServer {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let assessor = RiskAssessor::from_config(config)?;
        Ok(Self {
            address: config.bind_address(),
            state: AppState::new(assessor),
        })
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.address)
            .await
            .with_context(|| format!("Failed to bind {}", self.address))?;

        info!(address = %self.address, "Overwatch gateway listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        info!("Overwatch gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
