//! Per-seller financial breakdown and the policies that feed it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{Money, SellerId, UserId};

/// Marketplace cut of the merchandise subtotal: 5%.
pub const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Discounts granted to one seller order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discounts {
    pub shipping_discount: Money,
    pub voucher_discount: Money,
}

impl Discounts {
    pub fn none() -> Self {
        Self::default()
    }

    /// Negative discounts would act as surcharges; clamp them away.
    pub fn clamped(self) -> Self {
        Self {
            shipping_discount: self.shipping_discount.floor_zero(),
            voucher_discount: self.voucher_discount.floor_zero(),
        }
    }
}

/// Server-computed figures of one seller order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub merchandise_subtotal: Money,
    pub shipping_fee: Money,
    pub shipping_discount: Money,
    pub voucher_discount: Money,
    pub final_amount: Money,
    pub platform_fee: Money,
    pub earning_amount: Money,
}

impl PriceBreakdown {
    pub fn compute(merchandise_subtotal: Money, shipping_fee: Money, discounts: Discounts) -> Self {
        let discounts = discounts.clamped();
        let final_amount = (merchandise_subtotal + shipping_fee
            - discounts.shipping_discount
            - discounts.voucher_discount)
            .floor_zero();
        let platform_fee = merchandise_subtotal.scale(PLATFORM_FEE_RATE);
        let earning_amount = (final_amount - platform_fee).floor_zero();

        Self {
            merchandise_subtotal,
            shipping_fee,
            shipping_discount: discounts.shipping_discount,
            voucher_discount: discounts.voucher_discount,
            final_amount,
            platform_fee,
            earning_amount,
        }
    }
}

/// Shipping fee for one seller order.
pub trait ShippingPolicy: Send + Sync {
    fn shipping_fee(&self, seller_id: SellerId, merchandise_subtotal: Money) -> Money;
}

/// Same fee for every seller order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatShippingFee(pub Money);

impl ShippingPolicy for FlatShippingFee {
    fn shipping_fee(&self, _seller_id: SellerId, _merchandise_subtotal: Money) -> Money {
        self.0
    }
}

/// Inputs a promotion policy may look at.
#[derive(Debug, Clone, Copy)]
pub struct PromotionContext<'a> {
    pub buyer_id: UserId,
    pub seller_id: SellerId,
    pub merchandise_subtotal: Money,
    pub shipping_fee: Money,
    pub voucher_code: Option<&'a str>,
}

/// Discounts for one seller order.
pub trait PromotionPolicy: Send + Sync {
    fn discounts(&self, ctx: &PromotionContext<'_>) -> Discounts;
}

/// Grants nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPromotion;

impl PromotionPolicy for NoPromotion {
    fn discounts(&self, _ctx: &PromotionContext<'_>) -> Discounts {
        Discounts::none()
    }
}
