//! Seller orders domain module.
//!
//! One checkout yields one `Order` per seller. Financial figures are computed
//! here from live SKU prices only; this crate performs no IO.

pub mod event;
pub mod number;
pub mod order;
pub mod pricing;

pub use event::{OrderCreated, OrderEvent};
pub use number::OrderNumber;
pub use order::{Order, OrderItem, OrderStatus, PlaceOrder, PurchaseLine};
pub use pricing::{
    Discounts, FlatShippingFee, NoPromotion, PLATFORM_FEE_RATE, PriceBreakdown, PromotionContext,
    PromotionPolicy, ShippingPolicy,
};
