//! HTTP API surface.
//!
//! All business routes are tenant-scoped under `/v1/orgs/{org_id}`; the org
//! id in the path is the only tenancy signal and every query is filtered by
//! it. Authentication is the fronting gateway's job.

pub mod audit_events;
pub mod documents;
pub mod employees;
pub mod error;
pub mod health;
pub mod legal_holds;
pub mod policies;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::ServerConfig, services::Services};

/// Shared application state available to every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

/// Build the full router with middleware applied.
pub fn build_router(services: Services, config: &ServerConfig) -> Router {
    let state = AppState { services };

    let org_routes = Router::new()
        .route("/employees", post(employees::register))
        .route(
            "/employees/{employee_id}/termination",
            post(employees::terminate),
        )
        .route("/documents", post(documents::register))
        .route(
            "/documents/{document_id}/compliance",
            get(documents::compliance),
        )
        .route(
            "/documents/{document_id}/schedule",
            axum::routing::delete(documents::cancel_schedule),
        )
        .route(
            "/documents/{document_id}/schedule/recompute",
            post(documents::recompute),
        )
        .route("/policies", post(policies::create))
        .route("/policies/resolve", get(policies::resolve))
        .route("/policies/seed-defaults", post(policies::seed_defaults))
        .route("/policies/state-defaults", post(policies::set_state_default))
        .route("/policies/{policy_id}", get(policies::get))
        .route(
            "/legal-holds",
            post(legal_holds::create).get(legal_holds::list),
        )
        .route("/legal-holds/{hold_id}", get(legal_holds::get))
        .route("/legal-holds/{hold_id}/release", post(legal_holds::release))
        .route("/legal-holds/{hold_id}/repair", post(legal_holds::repair))
        .route("/audit-events", get(audit_events::list));

    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .nest("/v1/orgs/{org_id}", org_routes)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    if config.cors.enabled {
        router = router.layer(build_cors(config));
    }

    router.with_state(state)
}

fn build_cors(config: &ServerConfig) -> CorsLayer {
    if config.cors.allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<axum::http::HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
