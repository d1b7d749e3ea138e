//! Checkout orchestrator: cart → one persisted order per seller.
//!
//! There is no distributed transaction. Orders are persisted one seller at a
//! time; when a later seller fails, earlier sibling orders stay persisted.
//! Notification and cart clearing happen after every order is stored and
//! their failures are logged, never surfaced.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use bazaar_cart::Cart;
use bazaar_core::{AggregateRoot, DomainError, ExpectedVersion, Money, OrderId, SellerId, SkuId, UserId};
use bazaar_inventory::{PurchaseRejection, StockLine};
use bazaar_orders::{
    FlatShippingFee, NoPromotion, Order, OrderNumber, PlaceOrder, PromotionContext, PromotionPolicy, PurchaseLine,
    ShippingPolicy,
};

use crate::cart_store::{CartStore, CartStoreError};
use crate::config::StockMode;
use crate::error::ErrorKind;
use crate::inventory_store::{InventoryStore, InventoryStoreError};
use crate::notifier::OrderNotifier;
use crate::order_store::{OrderStore, OrderStoreError};
use crate::stock::{StockError, StockReservationManager};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    CartEmpty,

    #[error("no cart items are selected")]
    NoItemsSelected,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("sku not found: {0}")]
    SkuNotFound(SkuId),

    #[error("sku {0} is not available for purchase")]
    SkuInactive(SkuId),

    #[error("insufficient stock for sku {sku_id}: requested {requested}, available {available}")]
    InsufficientStock {
        sku_id: SkuId,
        requested: u32,
        available: u32,
    },

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("invalid order transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("failed to persist order: {0}")]
    Persistence(#[from] OrderStoreError),

    #[error(transparent)]
    CartStore(#[from] CartStoreError),

    #[error(transparent)]
    Inventory(#[from] InventoryStoreError),
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::CartEmpty | CheckoutError::NoItemsSelected | CheckoutError::Validation(_) => {
                ErrorKind::Validation
            }
            CheckoutError::SkuNotFound(_) | CheckoutError::OrderNotFound(_) => ErrorKind::NotFound,
            CheckoutError::SkuInactive(_)
            | CheckoutError::InsufficientStock { .. }
            | CheckoutError::InvalidTransition(_) => ErrorKind::Conflict,
            CheckoutError::Domain(e) => ErrorKind::of_domain(e),
            CheckoutError::Stock(e) => stock_error_kind(e),
            CheckoutError::Persistence(OrderStoreError::Concurrency(_)) => ErrorKind::Conflict,
            CheckoutError::Persistence(_) | CheckoutError::CartStore(_) | CheckoutError::Inventory(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::CartEmpty => "cart_empty",
            CheckoutError::NoItemsSelected => "no_items_selected",
            CheckoutError::Validation(_) => "validation_error",
            CheckoutError::SkuNotFound(_) => "sku_not_found",
            CheckoutError::SkuInactive(_) => "sku_inactive",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::OrderNotFound(_) => "order_not_found",
            CheckoutError::InvalidTransition(_) => "invalid_transition",
            CheckoutError::Domain(_) => "domain_error",
            CheckoutError::Stock(e) => e.code(),
            CheckoutError::Persistence(_) => "persistence_error",
            CheckoutError::CartStore(_) => "cart_store_error",
            CheckoutError::Inventory(_) => "inventory_error",
        }
    }
}

pub fn stock_error_kind(e: &StockError) -> ErrorKind {
    if e.is_retryable() {
        ErrorKind::Unavailable
    } else if e.is_conflict() {
        ErrorKind::Conflict
    } else {
        match e {
            StockError::Validation(_) => ErrorKind::Validation,
            StockError::SkuNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        }
    }
}

/// Buyer-supplied checkout inputs. Prices are never among them.
#[derive(Debug, Clone, Default)]
pub struct CheckoutRequest {
    pub shipping_reference: String,
    pub payment_method: String,
    pub voucher_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutResult {
    pub orders: Vec<Order>,
    pub order_numbers: Vec<OrderNumber>,
}

pub struct CheckoutService {
    carts: Arc<dyn CartStore>,
    inventory: Arc<dyn InventoryStore>,
    orders: Arc<dyn OrderStore>,
    stock: Arc<StockReservationManager>,
    notifier: Arc<dyn OrderNotifier>,
    shipping: Arc<dyn ShippingPolicy>,
    promotions: Arc<dyn PromotionPolicy>,
    stock_mode: StockMode,
}

impl CheckoutService {
    /// Flat zero shipping, no promotions, reservations on checkout.
    pub fn new(
        carts: Arc<dyn CartStore>,
        inventory: Arc<dyn InventoryStore>,
        orders: Arc<dyn OrderStore>,
        stock: Arc<StockReservationManager>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            carts,
            inventory,
            orders,
            stock,
            notifier,
            shipping: Arc::new(FlatShippingFee(Money::ZERO)),
            promotions: Arc::new(NoPromotion),
            stock_mode: StockMode::default(),
        }
    }

    pub fn with_shipping(mut self, shipping: Arc<dyn ShippingPolicy>) -> Self {
        self.shipping = shipping;
        self
    }

    pub fn with_promotions(mut self, promotions: Arc<dyn PromotionPolicy>) -> Self {
        self.promotions = promotions;
        self
    }

    pub fn with_stock_mode(mut self, stock_mode: StockMode) -> Self {
        self.stock_mode = stock_mode;
        self
    }

    pub fn stock_mode(&self) -> StockMode {
        self.stock_mode
    }

    /// Turn the buyer's selected cart items into one order per seller.
    ///
    /// Validation is all-or-nothing: any missing, inactive or short SKU
    /// aborts before anything is written.
    #[instrument(skip(self, request), fields(buyer_id = %buyer_id, stock_mode = self.stock_mode.as_str()), err)]
    pub fn create_order(&self, buyer_id: UserId, request: CheckoutRequest) -> Result<CheckoutResult, CheckoutError> {
        let shipping_reference = required("shipping_reference", &request.shipping_reference)?;
        let payment_method = required("payment_method", &request.payment_method)?;

        let cart = match self.carts.get_cart(buyer_id)? {
            Some(cart) if !cart.is_empty() => cart,
            _ => return Err(CheckoutError::CartEmpty),
        };
        let selected: Vec<(SkuId, u32)> = cart
            .selected_items()
            .into_iter()
            .map(|item| (item.sku_id, item.quantity))
            .collect();
        if selected.is_empty() {
            return Err(CheckoutError::NoItemsSelected);
        }

        let ids: Vec<SkuId> = selected.iter().map(|(id, _)| *id).collect();
        let mut skus = self.inventory.get_skus(&ids)?;

        let mut by_seller: BTreeMap<SellerId, Vec<PurchaseLine>> = BTreeMap::new();
        for (sku_id, quantity) in selected {
            let sku = skus.remove(&sku_id).ok_or(CheckoutError::SkuNotFound(sku_id))?;
            match sku.check_purchase(quantity) {
                Ok(()) => {}
                Err(PurchaseRejection::Inactive) => return Err(CheckoutError::SkuInactive(sku_id)),
                Err(PurchaseRejection::Insufficient { requested, available }) => {
                    return Err(CheckoutError::InsufficientStock {
                        sku_id,
                        requested,
                        available,
                    });
                }
            }
            by_seller.entry(sku.seller_id).or_default().push(PurchaseLine { sku, quantity });
        }

        let now = Utc::now();
        let numbers = OrderNumber::generate_batch(now, by_seller.len()).ok_or_else(|| {
            CheckoutError::Validation(format!("too many sellers in one checkout: {}", by_seller.len()))
        })?;
        let mut created: Vec<Order> = Vec::with_capacity(by_seller.len());
        for ((seller_id, lines), order_number) in by_seller.into_iter().zip(numbers) {
            let subtotal: Money = lines.iter().map(|l| l.sku.price.times(l.quantity)).sum();
            let shipping_fee = self.shipping.shipping_fee(seller_id, subtotal);
            let discounts = self.promotions.discounts(&PromotionContext {
                buyer_id,
                seller_id,
                merchandise_subtotal: subtotal,
                shipping_fee,
                voucher_code: request.voucher_code.as_deref(),
            });

            let order = Order::place(PlaceOrder {
                order_id: OrderId::new(),
                order_number,
                buyer_id,
                seller_id,
                lines,
                shipping_fee,
                discounts,
                payment_method: payment_method.to_string(),
                shipping_reference: shipping_reference.to_string(),
                ordered_at: now,
            })?;

            self.apply_stock_mode(&order).inspect_err(|e| {
                error!(
                    order_id = %order.order_id(),
                    seller_id = %seller_id,
                    persisted_siblings = created.len(),
                    error = %e,
                    "stock step failed during checkout"
                );
            })?;

            if let Err(e) = self.orders.insert(&order) {
                error!(
                    order_id = %order.order_id(),
                    seller_id = %seller_id,
                    persisted_siblings = created.len(),
                    error = %e,
                    "failed to persist order"
                );
                self.undo_stock_mode(&order);
                return Err(CheckoutError::Persistence(e));
            }

            info!(
                order_id = %order.order_id(),
                order_number = %order.order_number(),
                seller_id = %seller_id,
                final_amount = %order.totals().final_amount,
                "order created"
            );
            created.push(order);
        }

        for order in &created {
            if let Err(e) = self.notifier.order_created(order) {
                warn!(order_id = %order.order_id(), error = %e, "failed to publish order_created");
            }
        }

        self.clear_ordered_items(cart, &created);

        let order_numbers = created.iter().map(|o| o.order_number().clone()).collect();
        Ok(CheckoutResult {
            orders: created,
            order_numbers,
        })
    }

    fn apply_stock_mode(&self, order: &Order) -> Result<(), StockError> {
        let lines = stock_lines(order);
        match self.stock_mode {
            StockMode::None => Ok(()),
            StockMode::Reserve => self.stock.reserve_stock(order.order_id(), &lines).map(|_| ()),
            StockMode::Deduct => self.stock.deduct_stock(order.order_id(), &lines).map(|_| ()),
        }
    }

    /// Undo `apply_stock_mode` for an order that was never persisted.
    fn undo_stock_mode(&self, order: &Order) {
        let undone = match self.stock_mode {
            StockMode::None => return,
            StockMode::Reserve => self.stock.release_stock(order.order_id()).map(|_| ()),
            StockMode::Deduct => self.stock.restore_stock(order.order_id(), &stock_lines(order)).map(|_| ()),
        };
        if let Err(e) = undone {
            warn!(order_id = %order.order_id(), error = %e, "failed to undo stock step of unpersisted order");
        }
    }

    fn clear_ordered_items(&self, mut cart: Cart, created: &[Order]) {
        let ordered: Vec<SkuId> = created
            .iter()
            .flat_map(|o| o.items().iter().map(|i| i.sku_id))
            .collect();
        cart.remove_items(&ordered, Utc::now());

        let result = if cart.is_empty() {
            self.carts.delete_cart(cart.user_id())
        } else {
            self.carts.save_cart(&cart)
        };
        if let Err(e) = result {
            warn!(user_id = %cart.user_id(), error = %e, "failed to clear cart after checkout");
        }
    }

    /// An order of `buyer_id`. Orders of other buyers read as not found.
    pub fn get_order(&self, buyer_id: UserId, order_id: OrderId) -> Result<Order, CheckoutError> {
        match self.orders.get(order_id)? {
            Some(order) if order.buyer_id() == buyer_id => Ok(order),
            _ => Err(CheckoutError::OrderNotFound(order_id)),
        }
    }

    pub fn list_orders(&self, buyer_id: UserId) -> Result<Vec<Order>, CheckoutError> {
        Ok(self.orders.list_for_buyer(buyer_id)?)
    }

    /// Cancel a pending order and drop its reservations.
    #[instrument(skip(self), fields(buyer_id = %buyer_id, order_id = %order_id), err)]
    pub fn cancel_order(&self, buyer_id: UserId, order_id: OrderId) -> Result<Order, CheckoutError> {
        let mut order = self.get_order(buyer_id, order_id)?;
        self.transition(&mut order, |o, now| o.cancel(now))?;
        self.release_quietly(order_id);
        info!(order_id = %order_id, "order cancelled");
        Ok(order)
    }

    /// Apply a payment outcome to a pending order.
    ///
    /// Success deducts stock (unless it was already deducted at checkout) and
    /// marks the order paid. Failure releases reservations and cancels. A
    /// deduction conflict cancels the order and is surfaced; the deduction is
    /// all-or-nothing so a cancelled order holds no stock.
    #[instrument(skip(self), fields(order_id = %order_id), err)]
    pub fn settle_payment(&self, order_id: OrderId, succeeded: bool) -> Result<Order, CheckoutError> {
        let mut order = self.orders.get(order_id)?.ok_or(CheckoutError::OrderNotFound(order_id))?;
        if !order.is_pending() {
            return Err(CheckoutError::InvalidTransition(format!(
                "order {order_id} is {}",
                order.status().as_str()
            )));
        }

        if !succeeded {
            self.release_quietly(order_id);
            self.transition(&mut order, |o, now| o.cancel(now))?;
            info!(order_id = %order_id, "payment failed; order cancelled");
            return Ok(order);
        }

        let deducts_now = self.stock_mode != StockMode::Deduct;
        if deducts_now {
            if let Err(e) = self.stock.deduct_stock(order_id, &stock_lines(&order)) {
                if e.is_conflict() {
                    warn!(order_id = %order_id, error = %e, "stock gone at settlement; cancelling order");
                    self.release_quietly(order_id);
                    self.transition(&mut order, |o, now| o.cancel(now))?;
                }
                return Err(e.into());
            }
        }

        if let Err(e) = self.transition(&mut order, |o, now| o.mark_paid(now)) {
            if deducts_now {
                if let Err(restore_err) = self.stock.restore_stock(order_id, &stock_lines(&order)) {
                    error!(order_id = %order_id, error = %restore_err, "failed to give back stock of unpaid order");
                }
            }
            return Err(e);
        }
        info!(order_id = %order_id, "order paid");
        Ok(order)
    }

    fn transition(
        &self,
        order: &mut Order,
        apply: impl FnOnce(&mut Order, chrono::DateTime<Utc>) -> Result<(), DomainError>,
    ) -> Result<(), CheckoutError> {
        let expected = ExpectedVersion::Exact(order.version());
        apply(order, Utc::now()).map_err(|e| match e {
            DomainError::InvariantViolation(msg) => CheckoutError::InvalidTransition(msg),
            other => CheckoutError::Domain(other),
        })?;
        self.orders.update(order, expected)?;
        Ok(())
    }

    fn release_quietly(&self, order_id: OrderId) {
        if let Err(e) = self.stock.release_stock(order_id) {
            warn!(order_id = %order_id, error = %e, "failed to release reservations");
        }
    }
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, CheckoutError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CheckoutError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

fn stock_lines(order: &Order) -> Vec<StockLine> {
    order
        .items()
        .iter()
        .map(|i| StockLine::new(i.sku_id, i.quantity))
        .collect()
}
