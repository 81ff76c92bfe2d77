//! Shared value types for the storefront backend.
//!
//! Identifier newtypes keep UUIDs from different tables from being mixed
//! up, and [`Money`] keeps amounts in integer cents.

pub mod ids;
pub mod money;

pub use ids::{CartId, CartItemId, OrderId, ProductId, UserId};
pub use money::Money;
