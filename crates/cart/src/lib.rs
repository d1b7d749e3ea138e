//! Shopping cart domain module.
//!
//! A cart is a per-user record of purchase intents. It carries no pricing
//! authority: the cached name/price on each item exist for display only.

pub mod cart;

pub use cart::{Cart, CartItem, DisplayCache};
