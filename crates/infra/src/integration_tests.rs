//! Integration tests for the checkout path over in-memory adapters.
//!
//! Tests: Cart → Inventory → StockReservationManager → OrderStore → Notifier
//!
//! Verifies:
//! - Per-seller split and server-side pricing
//! - All-or-nothing validation and the partial-failure behavior
//! - Stock taken for an order that fails later is given back
//! - Stock never goes negative under concurrent deduction

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    use chrono::Utc;
    use serde_json::Value as JsonValue;

    use bazaar_cart::Cart;
    use bazaar_core::{ExpectedVersion, Money, OrderId, SellerId, SkuId, UserId};
    use bazaar_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
    use bazaar_inventory::{SkuSnapshot, SkuStatus, StockLine};
    use bazaar_orders::{
        Discounts, FlatShippingFee, Order, OrderStatus, PromotionContext, PromotionPolicy,
    };

    use crate::cart_store::{CartStore, InMemoryCartStore};
    use crate::checkout::{CheckoutError, CheckoutRequest, CheckoutService};
    use crate::config::StockMode;
    use crate::coordination::{CoordinationStore, InMemoryCoordinationStore};
    use crate::error::ErrorKind;
    use crate::inventory_store::{InMemoryInventoryStore, InventoryStore};
    use crate::notifier::{BusNotifier, NotifyError, OrderNotifier};
    use crate::order_store::{InMemoryOrderStore, OrderStore, OrderStoreError};
    use crate::stock::{LeaseManager, RetryPolicy, StockError, StockReservationManager};

    type JsonBus = InMemoryEventBus<EventEnvelope<JsonValue>>;

    struct Harness {
        carts: Arc<InMemoryCartStore>,
        inventory: Arc<InMemoryInventoryStore>,
        orders: Arc<InMemoryOrderStore>,
        coordination: Arc<InMemoryCoordinationStore>,
        stock: Arc<StockReservationManager>,
        bus: Arc<JsonBus>,
        events: Subscription<EventEnvelope<JsonValue>>,
    }

    impl Harness {
        fn new() -> Self {
            let carts = Arc::new(InMemoryCartStore::new());
            let inventory = Arc::new(InMemoryInventoryStore::new());
            let orders = Arc::new(InMemoryOrderStore::new());
            let coordination = Arc::new(InMemoryCoordinationStore::new());
            let leases = LeaseManager::new(
                coordination.clone(),
                Duration::from_secs(10),
                RetryPolicy::fixed(200, Duration::from_millis(1)),
            );
            let stock = Arc::new(StockReservationManager::new(
                inventory.clone(),
                coordination.clone(),
                leases,
                Duration::from_secs(900),
            ));
            let bus: Arc<JsonBus> = Arc::new(InMemoryEventBus::new());
            let events = bus.subscribe();
            Self {
                carts,
                inventory,
                orders,
                coordination,
                stock,
                bus,
                events,
            }
        }

        fn checkout(&self) -> CheckoutService {
            self.checkout_with(self.orders.clone(), Arc::new(BusNotifier::new(self.bus.clone())))
        }

        fn checkout_with(&self, orders: Arc<dyn OrderStore>, notifier: Arc<dyn OrderNotifier>) -> CheckoutService {
            CheckoutService::new(
                self.carts.clone(),
                self.inventory.clone(),
                orders,
                self.stock.clone(),
                notifier,
            )
        }

        fn sku(&self, seller_id: SellerId, price_minor: i64, qty: u32) -> SkuId {
            let id = SkuId::new();
            self.inventory.insert(SkuSnapshot {
                id,
                seller_id,
                name: format!("sku-{id}"),
                code: format!("C-{price_minor}"),
                price: Money::from_minor(price_minor),
                available_quantity: qty,
                is_active: true,
                status: SkuStatus::InStock,
            })
            .unwrap();
            id
        }

        fn deactivate(&self, sku_id: SkuId) {
            let mut sku = self.inventory.get(sku_id).unwrap();
            sku.is_active = false;
            self.inventory.insert(sku).unwrap();
        }

        fn cart(&self, buyer: UserId, items: &[(SkuId, u32, bool)]) {
            let mut cart = Cart::empty(buyer);
            let now = Utc::now();
            for (sku_id, qty, selected) in items {
                cart.add_item(*sku_id, *qty, None, now).unwrap();
                cart.set_selected(*sku_id, *selected, now).unwrap();
            }
            self.carts.save_cart(&cart).unwrap();
        }

        fn reservations_of(&self, order_id: OrderId) -> usize {
            self.stock.list_reservations(order_id).unwrap().len()
        }
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            shipping_reference: "addr-42".to_string(),
            payment_method: "card".to_string(),
            voucher_code: None,
        }
    }

    fn order_for(orders: &[Order], seller: SellerId) -> &Order {
        orders.iter().find(|o| o.seller_id() == seller).unwrap()
    }

    /// Fails every insert after the first `ok` ones.
    struct FailingOrderStore {
        inner: InMemoryOrderStore,
        ok: usize,
        inserts: AtomicUsize,
    }

    impl OrderStore for FailingOrderStore {
        fn insert(&self, order: &Order) -> Result<(), OrderStoreError> {
            if self.inserts.fetch_add(1, Ordering::SeqCst) >= self.ok {
                return Err(OrderStoreError::Backend("disk full".to_string()));
            }
            self.inner.insert(order)
        }

        fn get(&self, order_id: OrderId) -> Result<Option<Order>, OrderStoreError> {
            self.inner.get(order_id)
        }

        fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, OrderStoreError> {
            self.inner.list_for_buyer(buyer_id)
        }

        fn update(&self, order: &Order, expected: ExpectedVersion) -> Result<(), OrderStoreError> {
            self.inner.update(order, expected)
        }
    }

    struct BrokenNotifier;

    impl OrderNotifier for BrokenNotifier {
        fn order_created(&self, _order: &Order) -> Result<(), NotifyError> {
            Err(NotifyError::Publish("broker down".to_string()))
        }
    }

    struct VoucherPolicy;

    impl PromotionPolicy for VoucherPolicy {
        fn discounts(&self, ctx: &PromotionContext<'_>) -> Discounts {
            match ctx.voucher_code {
                Some("BIG") => Discounts {
                    shipping_discount: ctx.shipping_fee,
                    voucher_discount: Money::from_minor(100_000),
                },
                Some("NEG") => Discounts {
                    shipping_discount: Money::ZERO,
                    voucher_discount: Money::from_minor(-500),
                },
                _ => Discounts::none(),
            }
        }
    }

    #[test]
    fn two_sellers_produce_two_priced_orders() {
        let h = Harness::new();
        let (s1, s2) = (SellerId::new(), SellerId::new());
        let a = h.sku(s1, 1000, 5);
        let b = h.sku(s2, 2000, 5);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 2, true), (b, 1, true)]);

        let result = h.checkout().create_order(buyer, request()).unwrap();

        assert_eq!(result.orders.len(), 2);
        assert_eq!(result.order_numbers.len(), 2);
        for (seller, sku) in [(s1, a), (s2, b)] {
            let order = order_for(&result.orders, seller);
            assert_eq!(order.totals().merchandise_subtotal, Money::from_minor(2000));
            assert_eq!(order.totals().platform_fee, Money::from_minor(100));
            assert_eq!(order.totals().earning_amount, Money::from_minor(1900));
            assert_eq!(order.status(), OrderStatus::Pending);
            assert!(order.items().iter().all(|i| i.sku_id == sku));
            assert_eq!(h.reservations_of(order.order_id()), 1);
        }

        assert_eq!(h.orders.len(), 2);
        assert_eq!(h.events.drain().len(), 2);
        assert!(h.carts.get_cart(buyer).unwrap().is_none());
        // Reservations are advisory: nothing was decremented.
        assert_eq!(h.inventory.get(a).unwrap().available_quantity, 5);
    }

    #[test]
    fn live_price_wins_over_cart_cache() {
        let h = Harness::new();
        let seller = SellerId::new();
        let a = h.sku(seller, 1000, 5);
        let buyer = UserId::new();

        let mut cart = Cart::empty(buyer);
        cart.add_item(
            a,
            1,
            Some(bazaar_cart::DisplayCache {
                name: "old".to_string(),
                price: Money::from_minor(1),
            }),
            Utc::now(),
        )
        .unwrap();
        h.carts.save_cart(&cart).unwrap();

        let mut sku = h.inventory.get(a).unwrap();
        sku.price = Money::from_minor(1250);
        h.inventory.insert(sku).unwrap();

        let result = h.checkout().create_order(buyer, request()).unwrap();
        let order = &result.orders[0];
        assert_eq!(order.totals().merchandise_subtotal, Money::from_minor(1250));
        assert_eq!(order.items()[0].price_at_purchase, Money::from_minor(1250));
    }

    #[test]
    fn unselected_items_stay_in_cart() {
        let h = Harness::new();
        let seller = SellerId::new();
        let a = h.sku(seller, 1000, 5);
        let later = h.sku(seller, 500, 5);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 1, true), (later, 3, false)]);

        let result = h.checkout().create_order(buyer, request()).unwrap();
        assert_eq!(result.orders.len(), 1);
        assert_eq!(result.orders[0].items().len(), 1);

        let cart = h.carts.get_cart(buyer).unwrap().unwrap();
        assert_eq!(cart.len(), 1);
        let kept = cart.get(&later).unwrap();
        assert_eq!(kept.quantity, 3);
        assert!(!kept.selected);
    }

    #[test]
    fn empty_or_unselected_cart_creates_nothing() {
        let h = Harness::new();
        let buyer = UserId::new();

        let err = h.checkout().create_order(buyer, request()).unwrap_err();
        assert!(matches!(err, CheckoutError::CartEmpty));

        let a = h.sku(SellerId::new(), 1000, 5);
        h.cart(buyer, &[(a, 1, false)]);
        let err = h.checkout().create_order(buyer, request()).unwrap_err();
        assert!(matches!(err, CheckoutError::NoItemsSelected));
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(h.orders.is_empty());
        assert!(h.events.drain().is_empty());
    }

    #[test]
    fn missing_shipping_fields_are_rejected_before_anything_else() {
        let h = Harness::new();
        let buyer = UserId::new();
        let a = h.sku(SellerId::new(), 1000, 5);
        h.cart(buyer, &[(a, 1, true)]);

        let mut req = request();
        req.shipping_reference = "   ".to_string();
        let err = h.checkout().create_order(buyer, req).unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(msg) if msg.contains("shipping_reference")));

        assert!(h.orders.is_empty());
        assert_eq!(h.carts.get_cart(buyer).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn one_inactive_sku_aborts_the_whole_checkout() {
        let h = Harness::new();
        let (s1, s2) = (SellerId::new(), SellerId::new());
        let a = h.sku(s1, 1000, 5);
        let b = h.sku(s2, 2000, 5);
        h.deactivate(b);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 1, true), (b, 1, true)]);

        let err = h.checkout().create_order(buyer, request()).unwrap_err();
        assert!(matches!(err, CheckoutError::SkuInactive(id) if id == b));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert!(h.orders.is_empty());
        assert!(h.events.drain().is_empty());
        assert!(h.coordination.keys_with_prefix("bazaar:stock:reservation:").unwrap().is_empty());
        assert_eq!(h.carts.get_cart(buyer).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn short_and_unknown_skus_identify_the_offender() {
        let h = Harness::new();
        let seller = SellerId::new();
        let a = h.sku(seller, 1000, 1);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 2, true)]);

        let err = h.checkout().create_order(buyer, request()).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock { sku_id, requested: 2, available: 1 } if sku_id == a
        ));

        let other = UserId::new();
        let ghost = SkuId::new();
        h.cart(other, &[(ghost, 1, true)]);
        let err = h.checkout().create_order(other, request()).unwrap_err();
        assert!(matches!(err, CheckoutError::SkuNotFound(id) if id == ghost));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn persistence_failure_keeps_earlier_siblings() {
        let h = Harness::new();
        let (s1, s2) = (SellerId::new(), SellerId::new());
        let a = h.sku(s1, 1000, 5);
        let b = h.sku(s2, 2000, 5);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 1, true), (b, 1, true)]);

        let store = Arc::new(FailingOrderStore {
            inner: InMemoryOrderStore::new(),
            ok: 1,
            inserts: AtomicUsize::new(0),
        });
        let checkout = h.checkout_with(store.clone(), Arc::new(BusNotifier::new(h.bus.clone())));

        let err = checkout.create_order(buyer, request()).unwrap_err();
        assert!(matches!(err, CheckoutError::Persistence(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);

        let persisted = store.inner.list_for_buyer(buyer).unwrap();
        assert_eq!(persisted.len(), 1);
        // Only the persisted sibling keeps its reservations.
        let reserved = h.coordination.keys_with_prefix("bazaar:stock:reservation:").unwrap();
        assert_eq!(reserved.len(), 1);
        assert!(reserved[0].contains(&persisted[0].order_id().to_string()));

        assert!(h.events.drain().is_empty());
        assert_eq!(h.carts.get_cart(buyer).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn deduct_mode_persistence_failure_gives_stock_back() {
        let h = Harness::new();
        let a = h.sku(SellerId::new(), 1000, 5);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 2, true)]);

        let store = Arc::new(FailingOrderStore {
            inner: InMemoryOrderStore::new(),
            ok: 0,
            inserts: AtomicUsize::new(0),
        });
        let checkout = h
            .checkout_with(store.clone(), Arc::new(BusNotifier::new(h.bus.clone())))
            .with_stock_mode(StockMode::Deduct);

        let err = checkout.create_order(buyer, request()).unwrap_err();
        assert!(matches!(err, CheckoutError::Persistence(_)));

        assert!(store.inner.list_for_buyer(buyer).unwrap().is_empty());
        let sku = h.inventory.get(a).unwrap();
        assert_eq!(sku.available_quantity, 5);
        assert_eq!(sku.status, SkuStatus::InStock);
        assert_eq!(h.carts.get_cart(buyer).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn many_sellers_in_one_checkout_get_distinct_numbers() {
        let h = Harness::new();
        let checkout = h.checkout();

        for _ in 0..5 {
            let skus: Vec<SkuId> = (0..200).map(|_| h.sku(SellerId::new(), 100, 1)).collect();
            let buyer = UserId::new();
            let items: Vec<(SkuId, u32, bool)> = skus.iter().map(|s| (*s, 1, true)).collect();
            h.cart(buyer, &items);

            let result = checkout.create_order(buyer, request()).unwrap();
            assert_eq!(result.orders.len(), 200);
            let distinct: std::collections::HashSet<_> = result.order_numbers.iter().collect();
            assert_eq!(distinct.len(), 200);
        }
        assert_eq!(h.orders.len(), 1000);
    }

    #[test]
    fn publish_failure_is_not_fatal() {
        let h = Harness::new();
        let a = h.sku(SellerId::new(), 1000, 5);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 1, true)]);

        let checkout = h.checkout_with(h.orders.clone(), Arc::new(BrokenNotifier));
        let result = checkout.create_order(buyer, request()).unwrap();

        assert_eq!(result.orders.len(), 1);
        assert_eq!(h.orders.len(), 1);
        assert!(h.carts.get_cart(buyer).unwrap().is_none());
    }

    #[test]
    fn policies_feed_the_breakdown_and_floor_at_zero() {
        let h = Harness::new();
        let seller = SellerId::new();
        let a = h.sku(seller, 2000, 5);
        let buyer = UserId::new();

        let checkout = h
            .checkout()
            .with_shipping(Arc::new(FlatShippingFee(Money::from_minor(500))))
            .with_promotions(Arc::new(VoucherPolicy));

        h.cart(buyer, &[(a, 1, true)]);
        let plain = checkout.create_order(buyer, request()).unwrap();
        let totals = *plain.orders[0].totals();
        assert_eq!(totals.shipping_fee, Money::from_minor(500));
        assert_eq!(totals.final_amount, Money::from_minor(2500));
        assert_eq!(totals.earning_amount, Money::from_minor(2400));

        h.cart(buyer, &[(a, 1, true)]);
        let mut req = request();
        req.voucher_code = Some("BIG".to_string());
        let big = checkout.create_order(buyer, req).unwrap();
        let totals = *big.orders[0].totals();
        assert_eq!(totals.final_amount, Money::ZERO);
        assert_eq!(totals.platform_fee, Money::from_minor(100));
        assert_eq!(totals.earning_amount, Money::ZERO);

        h.cart(buyer, &[(a, 1, true)]);
        let mut req = request();
        req.voucher_code = Some("NEG".to_string());
        let neg = checkout.create_order(buyer, req).unwrap();
        assert_eq!(neg.orders[0].totals().voucher_discount, Money::ZERO);
        assert_eq!(neg.orders[0].totals().final_amount, Money::from_minor(2500));
    }

    #[test]
    fn concurrent_deductions_of_the_last_unit() {
        let h = Harness::new();
        let sku = h.sku(SellerId::new(), 1000, 1);
        let barrier = Barrier::new(2);
        let stock = &h.stock;

        let results: Vec<Result<_, StockError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        stock.deduct_stock(OrderId::new(), &[StockLine::new(sku, 1)])
                    })
                })
                .collect();
            handles.into_iter().map(|t| t.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(failure, StockError::InsufficientStock { .. }));
        assert!(failure.is_conflict());

        let left = h.inventory.get(sku).unwrap();
        assert_eq!(left.available_quantity, 0);
        assert_eq!(left.status, SkuStatus::OutOfStock);
    }

    #[test]
    fn concurrent_deduct_mode_checkouts_never_oversell() {
        let h = Harness::new();
        let sku = h.sku(SellerId::new(), 1000, 3);
        let buyers: Vec<UserId> = (0..6).map(|_| UserId::new()).collect();
        for buyer in &buyers {
            h.cart(*buyer, &[(sku, 1, true)]);
        }
        let checkout = h.checkout().with_stock_mode(StockMode::Deduct);
        let barrier = Barrier::new(buyers.len());

        let succeeded = std::thread::scope(|s| {
            let handles: Vec<_> = buyers
                .iter()
                .map(|buyer| {
                    let (checkout, barrier) = (&checkout, &barrier);
                    s.spawn(move || {
                        barrier.wait();
                        checkout.create_order(*buyer, request())
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|t| t.join().unwrap())
                .filter(|r| r.is_ok())
                .count()
        });

        assert_eq!(succeeded, 3);
        assert_eq!(h.orders.len(), 3);
        assert_eq!(h.inventory.get(sku).unwrap().available_quantity, 0);
    }

    #[test]
    fn lease_held_elsewhere_surfaces_as_unavailable() {
        let h = Harness::new();
        let sku = h.sku(SellerId::new(), 1000, 5);
        let buyer = UserId::new();
        h.cart(buyer, &[(sku, 1, true)]);

        let impatient = Arc::new(StockReservationManager::new(
            h.inventory.clone(),
            h.coordination.clone(),
            LeaseManager::new(h.coordination.clone(), Duration::from_secs(10), RetryPolicy::fixed(2, Duration::ZERO)),
            Duration::from_secs(900),
        ));
        h.coordination
            .put(&format!("bazaar:stock:lease:{sku}"), "other-holder", Duration::from_secs(10))
            .unwrap();

        let checkout = CheckoutService::new(
            h.carts.clone(),
            h.inventory.clone(),
            h.orders.clone(),
            impatient,
            Arc::new(BusNotifier::new(h.bus.clone())),
        )
        .with_stock_mode(StockMode::Deduct);

        let err = checkout.create_order(buyer, request()).unwrap_err();
        assert!(matches!(err, CheckoutError::Stock(StockError::LockUnavailable { attempts: 2, .. })));
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(h.orders.is_empty());
        assert_eq!(h.inventory.get(sku).unwrap().available_quantity, 5);
    }

    #[test]
    fn cancel_releases_reservations_once() {
        let h = Harness::new();
        let a = h.sku(SellerId::new(), 1000, 5);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 2, true)]);
        let checkout = h.checkout();
        let order = checkout.create_order(buyer, request()).unwrap().orders.remove(0);
        assert_eq!(h.reservations_of(order.order_id()), 1);

        let cancelled = checkout.cancel_order(buyer, order.order_id()).unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert_eq!(h.reservations_of(order.order_id()), 0);

        let err = checkout.cancel_order(buyer, order.order_id()).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidTransition(_)));

        let stranger = checkout.cancel_order(UserId::new(), order.order_id()).unwrap_err();
        assert!(matches!(stranger, CheckoutError::OrderNotFound(_)));
    }

    #[test]
    fn settlement_paths() {
        let h = Harness::new();
        let a = h.sku(SellerId::new(), 1000, 3);
        let checkout = h.checkout();

        let paid_buyer = UserId::new();
        h.cart(paid_buyer, &[(a, 2, true)]);
        let order = checkout.create_order(paid_buyer, request()).unwrap().orders.remove(0);
        let paid = checkout.settle_payment(order.order_id(), true).unwrap();
        assert_eq!(paid.status(), OrderStatus::Paid);
        assert_eq!(h.inventory.get(a).unwrap().available_quantity, 1);
        assert_eq!(h.reservations_of(order.order_id()), 0);
        assert!(matches!(
            checkout.settle_payment(order.order_id(), true),
            Err(CheckoutError::InvalidTransition(_))
        ));

        let failed_buyer = UserId::new();
        h.cart(failed_buyer, &[(a, 1, true)]);
        let order = checkout.create_order(failed_buyer, request()).unwrap().orders.remove(0);
        let cancelled = checkout.settle_payment(order.order_id(), false).unwrap();
        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert_eq!(h.inventory.get(a).unwrap().available_quantity, 1);

        // Two pending orders compete for the last unit at settlement.
        let (x, y) = (UserId::new(), UserId::new());
        h.cart(x, &[(a, 1, true)]);
        h.cart(y, &[(a, 1, true)]);
        let ox = checkout.create_order(x, request()).unwrap().orders.remove(0);
        let oy = checkout.create_order(y, request()).unwrap().orders.remove(0);
        checkout.settle_payment(ox.order_id(), true).unwrap();
        let err = checkout.settle_payment(oy.order_id(), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(checkout.get_order(y, oy.order_id()).unwrap().status(), OrderStatus::Cancelled);
        assert_eq!(h.inventory.get(a).unwrap().available_quantity, 0);
    }

    #[test]
    fn settlement_conflict_on_a_later_line_keeps_earlier_stock() {
        let h = Harness::new();
        let seller = SellerId::new();
        let a = h.sku(seller, 1000, 5);
        let b = h.sku(seller, 1000, 5);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 1, true), (b, 1, true)]);
        let checkout = h.checkout();
        let order = checkout.create_order(buyer, request()).unwrap().orders.remove(0);

        // Deduction runs in SKU order; empty the later one.
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        h.inventory.decrement(second, 5).unwrap();

        let err = checkout.settle_payment(order.order_id(), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(checkout.get_order(buyer, order.order_id()).unwrap().status(), OrderStatus::Cancelled);
        assert_eq!(h.inventory.get(first).unwrap().available_quantity, 5);
        assert_eq!(h.inventory.get(second).unwrap().available_quantity, 0);
    }

    #[test]
    fn orders_are_buyer_scoped() {
        let h = Harness::new();
        let a = h.sku(SellerId::new(), 1000, 5);
        let buyer = UserId::new();
        h.cart(buyer, &[(a, 1, true)]);
        let checkout = h.checkout();
        let order = checkout.create_order(buyer, request()).unwrap().orders.remove(0);

        assert_eq!(checkout.get_order(buyer, order.order_id()).unwrap(), order);
        assert_eq!(checkout.list_orders(buyer).unwrap().len(), 1);
        assert!(checkout.list_orders(UserId::new()).unwrap().is_empty());
        assert!(matches!(
            checkout.get_order(UserId::new(), order.order_id()),
            Err(CheckoutError::OrderNotFound(_))
        ));
    }
}
