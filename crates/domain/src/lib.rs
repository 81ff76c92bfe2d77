//! Domain layer for the storefront backend.
//!
//! This crate provides the workflows over the storage layer:
//! - [`OrderService`] for checkout (cart to order, with stock commitment)
//!   and cancellation (status flip with stock restoration)
//! - [`CartService`] for cart mutation with advisory stock checks
//! - [`CatalogService`] for thin product CRUD
//!
//! Correctness under concurrency comes from the storage layer's
//! transactions and row locks; the services here are transaction scripts.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod orders;

pub use cart::{CartService, CartUpdate, CartView};
pub use catalog::{CatalogService, ProductUpdate};
pub use error::DomainError;
pub use orders::{OrderService, PlacedOrder};

pub use store::{CartItem, CartLine, Order, OrderItem, OrderStatus, Product};
