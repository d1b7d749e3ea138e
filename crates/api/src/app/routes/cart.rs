use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use bazaar_cart::Cart;
use bazaar_core::SkuId;
use bazaar_infra::cart_service::CartServiceError;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};
use crate::context::BuyerContext;

pub fn router() -> Router {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/:sku_id", patch(update_item).delete(remove_item))
}

fn cart_response(result: Result<Cart, CartServiceError>) -> axum::response::Response {
    match result {
        Ok(cart) => Json(dto::CartView::from(&cart)).into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
) -> axum::response::Response {
    let user_id = buyer.user_id();
    match services::blocking(move || services.carts.get_cart(user_id)).await {
        Ok(result) => cart_response(result),
        Err(resp) => resp,
    }
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Json(body): Json<dto::AddCartItemRequest>,
) -> axum::response::Response {
    let sku_id: SkuId = match errors::parse_id(&body.sku_id, "sku") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let user_id = buyer.user_id();
    match services::blocking(move || services.carts.add_item(user_id, sku_id, body.quantity)).await {
        Ok(result) => cart_response(result),
        Err(resp) => resp,
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Path(sku_id): Path<String>,
    Json(body): Json<dto::UpdateCartItemRequest>,
) -> axum::response::Response {
    let sku_id: SkuId = match errors::parse_id(&sku_id, "sku") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if body.quantity.is_none() && body.selected.is_none() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "provide quantity and/or selected",
        );
    }

    let user_id = buyer.user_id();
    let result = services::blocking(move || {
        services
            .carts
            .update_item(user_id, sku_id, body.quantity, body.selected)
    })
    .await;
    match result {
        Ok(result) => cart_response(result),
        Err(resp) => resp,
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(buyer): Extension<BuyerContext>,
    Path(sku_id): Path<String>,
) -> axum::response::Response {
    let sku_id: SkuId = match errors::parse_id(&sku_id, "sku") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let user_id = buyer.user_id();
    match services::blocking(move || services.carts.remove_item(user_id, sku_id)).await {
        Ok(result) => cart_response(result),
        Err(resp) => resp,
    }
}
