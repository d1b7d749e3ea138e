use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_cart::{Cart, CartItem};
use bazaar_core::{OrderId, SkuId, UserId};
use bazaar_infra::checkout::{CheckoutRequest, CheckoutResult};
use bazaar_inventory::StockLine;
use bazaar_orders::{Order, OrderNumber};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub sku_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: Option<u32>,
    pub selected: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub shipping_reference: String,
    #[serde(default)]
    pub payment_method: String,
    pub voucher_code: Option<String>,
}

impl From<CreateOrderRequest> for CheckoutRequest {
    fn from(body: CreateOrderRequest) -> Self {
        CheckoutRequest {
            shipping_reference: body.shipping_reference,
            payment_method: body.payment_method,
            voucher_code: body.voucher_code.filter(|code| !code.trim().is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub succeeded: bool,
}

#[derive(Debug, Deserialize)]
pub struct StockLineRequest {
    pub sku_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct StockCheckRequest {
    pub items: Vec<StockLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct StockOrderRequest {
    pub order_id: String,
    pub items: Vec<StockLineRequest>,
}

pub fn parse_stock_lines(items: &[StockLineRequest]) -> Result<Vec<StockLine>, axum::response::Response> {
    items
        .iter()
        .map(|line| Ok(StockLine::new(errors::parse_id::<SkuId>(&line.sku_id, "sku")?, line.quantity)))
        .collect()
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CartView {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub selected_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            user_id: cart.user_id(),
            items: cart.items().cloned().collect(),
            selected_count: cart.selected_items().len(),
            updated_at: cart.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub orders: Vec<Order>,
    pub order_numbers: Vec<OrderNumber>,
}

impl From<CheckoutResult> for CheckoutResponse {
    fn from(result: CheckoutResult) -> Self {
        Self {
            orders: result.orders,
            order_numbers: result.order_numbers,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub order_id: OrderId,
    pub released: usize,
}
