use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use bazaar_core::OrderId;
use bazaar_infra::checkout::CheckoutError;
use bazaar_orders::Order;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};
use crate::context::BuyerContext;

pub fn router() -> Router {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/payment", post(settle_payment))
}

fn order_response(result: Result<Order, CheckoutError>) -> axum::response::Response {
    match result {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let buyer_id = buyer.user_id();
    let result = match services::blocking(move || services.checkout.create_order(buyer_id, body.into())).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match result {
        Ok(created) => (StatusCode::CREATED, Json(dto::CheckoutResponse::from(created))).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
) -> axum::response::Response {
    let buyer_id = buyer.user_id();
    let result = match services::blocking(move || services.checkout.list_orders(buyer_id)).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match result {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let buyer_id = buyer.user_id();
    match services::blocking(move || services.checkout.get_order(buyer_id, order_id)).await {
        Ok(result) => order_response(result),
        Err(resp) => resp,
    }
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let buyer_id = buyer.user_id();
    match services::blocking(move || services.checkout.cancel_order(buyer_id, order_id)).await {
        Ok(result) => order_response(result),
        Err(resp) => resp,
    }
}

/// Payment outcome callback. Only the buyer's own orders can be settled here.
pub async fn settle_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PaymentRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let buyer_id = buyer.user_id();
    let result = services::blocking(move || -> Result<Order, CheckoutError> {
        services.checkout.get_order(buyer_id, order_id)?;
        services.checkout.settle_payment(order_id, body.succeeded)
    })
    .await;
    match result {
        Ok(result) => order_response(result),
        Err(resp) => resp,
    }
}
