//! Infrastructure layer: config, coordination, stores, stock manager,
//! notifications and the checkout/cart services built on them.

pub mod cart_service;
pub mod cart_store;
pub mod checkout;
pub mod config;
pub mod coordination;
pub mod error;
pub mod event_bus;
pub mod inventory_store;
pub mod notifier;
pub mod order_store;
pub mod pg;
pub mod stock;

mod integration_tests;

pub use error::ErrorKind;
