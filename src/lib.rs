//! Lead Manager API Library
//!
//! REST API for tabular lead management: create, list with filters and
//! pagination, read, update, delete and bulk delete, behind a JWT session gate.
//!
//! # Modules
//!
//! - `auth`: Session token verification middleware and auth endpoints.
//! - `config`: Configuration management.
//! - `db`: Database connection pool and migrations.
//! - `db_storage`: PostgreSQL lead store.
//! - `docs`: OpenAPI document and Swagger UI.
//! - `errors`: Error handling types.
//! - `filter`: Query-string filter translation.
//! - `handlers`: HTTP request handlers.
//! - `memory_store`: In-process lead store.
//! - `models`: Core data models.
//! - `pagination`: Page/limit normalization.
//! - `services`: Lead operations over a store.
//! - `store`: Storage trait.

pub mod auth;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod docs;
pub mod errors;
pub mod filter;
pub mod handlers;
pub mod memory_store;
pub mod models;
pub mod pagination;
pub mod services;
pub mod store;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::AppState;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS_ORIGIN '{}': {}", origin, e);
            cors
        }
    }
}

/// Builds the application router.
///
/// Lead routes and `/api/auth/me` sit behind [`auth::require_auth`];
/// `/health`, `/api/auth/logout` and the docs are public. Rate limiting is
/// left to the caller since it needs the peer address.
///
/// # Arguments
///
/// * `state` - Shared application state.
///
/// # Returns
///
/// * `Router` - The router with tracing, body limit and CORS layers applied.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origin);

    let protected_routes = Router::new()
        .route(
            "/api/leads",
            get(handlers::list_leads)
                .post(handlers::create_lead)
                .delete(handlers::delete_all_leads),
        )
        .route(
            "/api/leads/:id",
            get(handlers::get_lead)
                .put(handlers::update_lead)
                .delete(handlers::delete_lead),
        )
        .route("/api/auth/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/logout", post(auth::logout))
        .merge(protected_routes)
        .merge(docs::swagger_ui())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(cors),
        )
}
