use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value as JsonValue;
use thiserror::Error;

use bazaar_events::{EventEnvelope, InMemoryEventBus};
use bazaar_infra::{
    cart_service::CartService,
    cart_store::{CartStore, InMemoryCartStore},
    checkout::CheckoutService,
    config::Settings,
    coordination::{CoordinationStore, InMemoryCoordinationStore},
    inventory_store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore},
    notifier::{BusNotifier, OrderNotifier},
    order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore},
    pg,
    stock::{LeaseManager, StockReservationManager},
};
use bazaar_orders::FlatShippingFee;

#[cfg(feature = "redis")]
use bazaar_infra::{
    cart_store::{CartStoreError, RedisCartStore},
    coordination::{CoordinationError, RedisCoordinationStore},
    event_bus::{RedisBusError, RedisPubSubEventBus},
};

use crate::app::errors;

pub type JsonEventBus = InMemoryEventBus<EventEnvelope<JsonValue>>;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("database setup failed: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "redis")]
    #[error(transparent)]
    Coordination(#[from] CoordinationError),

    #[cfg(feature = "redis")]
    #[error(transparent)]
    CartStore(#[from] CartStoreError),

    #[cfg(feature = "redis")]
    #[error(transparent)]
    EventBus(#[from] RedisBusError),

    #[cfg(not(feature = "redis"))]
    #[error("BAZAAR_REDIS_URL is set but this binary was built without the `redis` feature")]
    RedisDisabled,
}

/// Service handles shared by every request.
#[derive(Clone)]
pub struct AppServices {
    pub carts: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub stock: Arc<StockReservationManager>,
}

/// In-memory wiring plus the handles tests use to seed and inspect it.
pub struct InMemoryServices {
    pub services: AppServices,
    pub inventory: Arc<InMemoryInventoryStore>,
    pub orders: Arc<InMemoryOrderStore>,
    pub bus: Arc<JsonEventBus>,
}

impl AppServices {
    /// Everything in process memory. Inventory starts empty.
    pub fn in_memory(settings: &Settings) -> InMemoryServices {
        let inventory = Arc::new(InMemoryInventoryStore::new());
        let orders = Arc::new(InMemoryOrderStore::new());
        let bus: Arc<JsonEventBus> = Arc::new(InMemoryEventBus::new());

        let services = assemble(
            settings,
            Arc::new(InMemoryCartStore::new()),
            inventory.clone(),
            orders.clone(),
            Arc::new(InMemoryCoordinationStore::new()),
            Arc::new(BusNotifier::new(bus.clone())),
        );

        InMemoryServices {
            services,
            inventory,
            orders,
            bus,
        }
    }
}

/// Wire services from settings.
///
/// Postgres backs inventory and orders when `database_url` is set; Redis backs
/// coordination, carts and notifications when `redis_url` is set. Anything
/// unset falls back to process memory.
pub async fn build_services(settings: &Settings) -> Result<AppServices, ServicesError> {
    let (inventory, orders): (Arc<dyn InventoryStore>, Arc<dyn OrderStore>) = match &settings.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await?;
            pg::ensure_schema(&pool).await?;
            tracing::info!("using postgres inventory and order stores");
            (
                Arc::new(PostgresInventoryStore::new(pool.clone())),
                Arc::new(PostgresOrderStore::new(pool)),
            )
        }
        None => {
            tracing::warn!("BAZAAR_DATABASE_URL not set; inventory and orders are in-memory");
            (Arc::new(InMemoryInventoryStore::new()), Arc::new(InMemoryOrderStore::new()))
        }
    };

    let (carts, coordination, notifier) = redis_backends(settings)?;

    Ok(assemble(settings, carts, inventory, orders, coordination, notifier))
}

type RedisBackends = (Arc<dyn CartStore>, Arc<dyn CoordinationStore>, Arc<dyn OrderNotifier>);

#[cfg(feature = "redis")]
fn redis_backends(settings: &Settings) -> Result<RedisBackends, ServicesError> {
    match &settings.redis_url {
        Some(url) => {
            tracing::info!(channel = %settings.events_channel, "using redis coordination, carts and pub/sub");
            let bus = RedisPubSubEventBus::new(url, settings.events_channel.clone())?;
            Ok((
                Arc::new(RedisCartStore::new(url, settings.cart_ttl)?),
                Arc::new(RedisCoordinationStore::new(url)?),
                Arc::new(BusNotifier::new(bus)),
            ))
        }
        None => Ok(in_memory_backends()),
    }
}

#[cfg(not(feature = "redis"))]
fn redis_backends(settings: &Settings) -> Result<RedisBackends, ServicesError> {
    match settings.redis_url {
        Some(_) => Err(ServicesError::RedisDisabled),
        None => Ok(in_memory_backends()),
    }
}

fn in_memory_backends() -> RedisBackends {
    tracing::warn!("BAZAAR_REDIS_URL not set; leases and reservations only coordinate within this process");
    let bus: JsonEventBus = InMemoryEventBus::new();
    (
        Arc::new(InMemoryCartStore::new()),
        Arc::new(InMemoryCoordinationStore::new()),
        Arc::new(BusNotifier::new(bus)),
    )
}

fn assemble(
    settings: &Settings,
    carts: Arc<dyn CartStore>,
    inventory: Arc<dyn InventoryStore>,
    orders: Arc<dyn OrderStore>,
    coordination: Arc<dyn CoordinationStore>,
    notifier: Arc<dyn OrderNotifier>,
) -> AppServices {
    let leases = LeaseManager::new(coordination.clone(), settings.lease_ttl, settings.lease_retry_policy());
    let stock = Arc::new(StockReservationManager::new(
        inventory.clone(),
        coordination,
        leases,
        settings.reservation_ttl,
    ));

    let checkout = CheckoutService::new(carts.clone(), inventory.clone(), orders, stock.clone(), notifier)
        .with_shipping(Arc::new(FlatShippingFee(settings.flat_shipping_fee)))
        .with_stock_mode(settings.stock_mode);

    AppServices {
        carts: Arc::new(CartService::new(carts, inventory)),
        checkout: Arc::new(checkout),
        stock,
    }
}

/// Run a blocking service call on tokio's blocking pool.
///
/// Store adapters block on I/O (Redis) or on the runtime handle (Postgres), so
/// they must never run on an async worker thread.
pub async fn blocking<T, F>(f: F) -> Result<T, axum::response::Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "blocking task failed");
        errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "request worker failed")
    })
}
