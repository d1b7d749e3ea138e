use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bazaar_infra::{
    ErrorKind,
    cart_service::CartServiceError,
    checkout::{CheckoutError, stock_error_kind},
    stock::StockError,
};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn checkout_error_to_response(err: CheckoutError) -> axum::response::Response {
    match err {
        CheckoutError::Stock(e) => stock_error_to_response(e),
        other => {
            let status = status_for(other.kind());
            if status.is_server_error() {
                tracing::error!(error = %other, "checkout request failed");
            }
            json_error(status, other.code(), other.to_string())
        }
    }
}

pub fn cart_error_to_response(err: CartServiceError) -> axum::response::Response {
    let code = match &err {
        CartServiceError::Domain(_) => "validation_error",
        CartServiceError::SkuNotFound(_) => "sku_not_found",
        CartServiceError::SkuInactive(_) => "sku_inactive",
        CartServiceError::Store(_) => "cart_store_error",
        CartServiceError::Inventory(_) => "inventory_error",
    };
    let status = status_for(err.kind());
    if status.is_server_error() {
        tracing::error!(error = %err, "cart request failed");
    }
    json_error(status, code, err.to_string())
}

/// Shortages are listed so clients can point at the offending SKUs.
pub fn stock_error_to_response(err: StockError) -> axum::response::Response {
    let status = status_for(stock_error_kind(&err));
    if status.is_server_error() {
        tracing::error!(error = %err, "stock request failed");
    }
    match &err {
        StockError::Unavailable(shortages) => (
            status,
            axum::Json(json!({
                "error": err.code(),
                "message": err.to_string(),
                "unavailable": shortages,
            })),
        )
            .into_response(),
        _ => json_error(status, err.code(), err.to_string()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &'static str) -> Result<T, axum::response::Response> {
    raw.trim()
        .parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
