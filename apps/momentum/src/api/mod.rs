//! # Momentum HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /v1/releases` - Every project with its recent releases
//! - `GET /v1/releases/{slug}` - One project with recent releases and builds
//! - `GET /v1/releases/{slug}/versions/latest` - Latest development, beta and stable release
//! - `GET /v1/releases/{slug}/versions/latest/{tier}` - Releases of one tier
//! - `GET /v1/releases/{slug}/versions/latest/{tier}/download` - Redirect to the newest build
//! - `GET /v1/releases/{slug}/versions/{version}` - One release
//! - `GET /v1/releases/{slug}/versions/{version}/builds/{build_id}/download` - Redirect to a build
//! - `PUT /v1/releases/{slug}/versions` - Create a release
//! - `PUT /v1/releases/{slug}/versions/{version}` - Edit a release status
//! - `PUT /v1/releases/{slug}/versions/{version}/builds/{build_id}` - Register a build
//! - `GET /health` - Health check
//!
//! ## Configuration
//!
//! - `server.cors_origins` / `MOMENTUM_CORS_ORIGINS`: comma-separated list of
//!   allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

pub use handlers::{
    create_release_handler, download_build_handler, download_tier_handler,
    edit_release_handler, health_handler, latest_for_tier_handler, latest_releases_handler,
    list_projects_handler, project_handler, register_build_handler, release_handler,
};
pub use types::{
    ApiError, BuildMutationResponse, CreateReleaseForm, EditReleaseForm, ErrorResponse,
    HealthResponse, MutationReleaseJson, ProjectResponse, ProjectsResponse, RegisterBuildForm,
    ReleaseMutationResponse, ReleaseResponse, TierResponse,
};

use crate::config::ServerConfig;
use crate::error::AppError;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, put},
};
use momentum_core::Catalog;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request bodies are small forms.
const MAX_BODY_BYTES: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the catalog.
///
/// The catalog opens one transaction per call, so handlers share it without a lock.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
}

impl AppState {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from the configured origins.
///
/// - `"*"`: allows all origins
/// - unset: localhost only
/// - otherwise: the comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/v1/releases", get(handlers::list_projects_handler))
        .route("/v1/releases/", get(handlers::list_projects_handler))
        .route("/v1/releases/{slug}", get(handlers::project_handler))
        .route(
            "/v1/releases/{slug}/versions",
            put(handlers::create_release_handler),
        )
        .route(
            "/v1/releases/{slug}/versions/latest",
            get(handlers::latest_releases_handler),
        )
        .route(
            "/v1/releases/{slug}/versions/latest/{tier}",
            get(handlers::latest_for_tier_handler),
        )
        .route(
            "/v1/releases/{slug}/versions/latest/{tier}/download",
            get(handlers::download_tier_handler),
        )
        .route(
            "/v1/releases/{slug}/versions/{version}",
            get(handlers::release_handler).put(handlers::edit_release_handler),
        )
        .route(
            "/v1/releases/{slug}/versions/{version}/builds/{build_id}",
            put(handlers::register_build_handler),
        )
        .route(
            "/v1/releases/{slug}/versions/{version}/builds/{build_id}/download",
            get(handlers::download_build_handler),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(server.cors_origins.as_deref()))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(catalog: Catalog, server: &ServerConfig) -> Result<(), AppError> {
    let router = create_router(AppState::new(catalog), server);
    let addr = server.addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Momentum HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
