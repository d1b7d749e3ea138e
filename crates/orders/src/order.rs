use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{AggregateRoot, DomainError, DomainResult, Money, OrderId, SellerId, SkuId, UserId};
use bazaar_inventory::SkuSnapshot;

use crate::number::OrderNumber;
use crate::pricing::{Discounts, PriceBreakdown};

/// Seller order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Order line with its immutable price-at-purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub sku_id: SkuId,
    pub name: String,
    pub code: String,
    pub quantity: u32,
    pub price_at_purchase: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.price_at_purchase.times(self.quantity)
    }
}

/// A live SKU and the quantity being bought from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseLine {
    pub sku: SkuSnapshot,
    pub quantity: u32,
}

/// Everything needed to place one seller order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub buyer_id: UserId,
    pub seller_id: SellerId,
    pub lines: Vec<PurchaseLine>,
    pub shipping_fee: Money,
    pub discounts: Discounts,
    pub payment_method: String,
    pub shipping_reference: String,
    pub ordered_at: DateTime<Utc>,
}

/// Aggregate root: Order (one seller's share of a checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: OrderNumber,
    buyer_id: UserId,
    seller_id: SellerId,
    status: OrderStatus,
    #[serde(flatten)]
    totals: PriceBreakdown,
    payment_method: String,
    shipping_reference: String,
    ordered_at: DateTime<Utc>,
    items: Vec<OrderItem>,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a pending order from live SKU data.
    ///
    /// Every line must belong to `seller_id`; prices come from the SKU
    /// snapshots, never from caller-supplied figures.
    pub fn place(cmd: PlaceOrder) -> DomainResult<Self> {
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }

        let mut items = Vec::with_capacity(cmd.lines.len());
        for line in cmd.lines {
            if line.sku.seller_id != cmd.seller_id {
                return Err(DomainError::invariant(format!(
                    "sku {} belongs to seller {}, not {}",
                    line.sku.id, line.sku.seller_id, cmd.seller_id
                )));
            }
            if line.quantity == 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            items.push(OrderItem {
                sku_id: line.sku.id,
                name: line.sku.name,
                code: line.sku.code,
                quantity: line.quantity,
                price_at_purchase: line.sku.price,
            });
        }

        let subtotal: Money = items.iter().map(OrderItem::line_total).sum();
        let totals = PriceBreakdown::compute(subtotal, cmd.shipping_fee, cmd.discounts);

        Ok(Self {
            id: cmd.order_id,
            order_number: cmd.order_number,
            buyer_id: cmd.buyer_id,
            seller_id: cmd.seller_id,
            status: OrderStatus::Pending,
            totals,
            payment_method: cmd.payment_method,
            shipping_reference: cmd.shipping_reference,
            ordered_at: cmd.ordered_at,
            items,
            version: 1,
            updated_at: cmd.ordered_at,
        })
    }

    pub fn order_id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    pub fn seller_id(&self) -> SellerId {
        self.seller_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn totals(&self) -> &PriceBreakdown {
        &self.totals
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn shipping_reference(&self) -> &str {
        &self.shipping_reference
    }

    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, OrderStatus::Pending)
    }

    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(OrderStatus::Paid, at)
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition(OrderStatus::Cancelled, at)
    }

    fn transition(&mut self, to: OrderStatus, at: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_pending() {
            return Err(DomainError::invariant(format!(
                "order {} is {} and cannot become {}",
                self.id,
                self.status.as_str(),
                to.as_str()
            )));
        }
        self.status = to;
        self.updated_at = at;
        self.version += 1;
        Ok(())
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
