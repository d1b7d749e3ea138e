//! `bazaar-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the checkout
//! crates (no infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{OrderId, SellerId, SkuId, UserId};
pub use money::Money;
pub use value_object::ValueObject;
