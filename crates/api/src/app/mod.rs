//! HTTP API application wiring (axum router + service wiring).
//!
//! - `services.rs`: store/backend selection and the shared service handles
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use bazaar_infra::config::Settings;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from settings (public entrypoint used by `main.rs`).
pub async fn build_app(settings: &Settings) -> Result<Router, services::ServicesError> {
    let services = services::build_services(settings).await?;
    Ok(build_app_with(Arc::new(services)))
}

/// Build the router around already-wired services.
pub fn build_app_with(services: Arc<services::AppServices>) -> Router {
    // Buyer routes: require the x-user-id header.
    let buyer = routes::buyer_router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn(middleware::buyer_middleware));

    // Stock routes are called by other services, not buyers.
    let internal = routes::internal_router().layer(Extension(services));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(buyer)
        .merge(internal)
        .layer(ServiceBuilder::new())
}
