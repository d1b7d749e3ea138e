use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use bazaar_core::OrderId;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/check", post(check_stock))
        .route("/reservations", post(reserve_stock))
        .route("/reservations/:order_id", get(list_reservations).delete(release_stock))
        .route("/deductions", post(deduct_stock))
}

pub async fn check_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::StockCheckRequest>,
) -> axum::response::Response {
    let lines = match dto::parse_stock_lines(&body.items) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = match services::blocking(move || services.stock.check_stock(&lines)).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match result {
        Ok(check) => Json(check).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn reserve_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::StockOrderRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&body.order_id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lines = match dto::parse_stock_lines(&body.items) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = match services::blocking(move || services.stock.reserve_stock(order_id, &lines)).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match result {
        Ok(reservations) => (StatusCode::CREATED, Json(reservations)).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn list_reservations(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&order_id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = match services::blocking(move || services.stock.list_reservations(order_id)).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match result {
        Ok(reservations) => Json(reservations).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

pub async fn release_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&order_id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = match services::blocking(move || services.stock.release_stock(order_id)).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match result {
        Ok(released) => Json(dto::ReleaseResponse { order_id, released }).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}

/// Decrement inventory for an order, one SKU lease at a time.
pub async fn deduct_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::StockOrderRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&body.order_id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lines = match dto::parse_stock_lines(&body.items) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = match services::blocking(move || services.stock.deduct_stock(order_id, &lines)).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match result {
        Ok(skus) => Json(skus).into_response(),
        Err(e) => errors::stock_error_to_response(e),
    }
}
