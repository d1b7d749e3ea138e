use axum::Router;

pub mod cart;
pub mod orders;
pub mod stock;
pub mod system;

/// Router for all buyer-scoped endpoints.
pub fn buyer_router() -> Router {
    Router::new().merge(cart::router()).merge(orders::router())
}

/// Router for service-to-service stock endpoints.
pub fn internal_router() -> Router {
    Router::new().nest("/stock", stock::router())
}
