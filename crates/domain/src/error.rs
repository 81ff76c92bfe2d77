//! Domain error taxonomy.
//!
//! Validation, not-found, state, and stock failures are all recoverable
//! per-request and surface to the caller as 4xx responses; storage errors
//! pass through as [`DomainError::Store`].

use store::{OrderStatus, StoreError};
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Quantity inputs must be positive integers.
    #[error("quantity must be a positive number")]
    InvalidQuantity,

    /// Product names must be non-empty.
    #[error("product name must not be empty")]
    InvalidProductName,

    /// Prices must not be negative.
    #[error("price must not be negative")]
    InvalidPrice,

    /// Stock counts must not be negative.
    #[error("stock must not be negative")]
    InvalidStock,

    /// The referenced product does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// The caller has no cart yet.
    #[error("you do not have a cart")]
    CartNotFound,

    /// The referenced cart item does not exist in the caller's cart.
    #[error("cart item not found")]
    CartItemNotFound,

    /// The referenced order does not exist or is not owned by the caller.
    #[error("order not found")]
    OrderNotFound,

    /// Requested quantity exceeds the product's available stock.
    #[error("not enough stock available")]
    NotEnoughStock,

    /// The summed cart quantity for a product exceeds its available stock.
    #[error("total quantity exceeds available stock")]
    OverStock,

    /// Checkout requires a non-empty cart.
    #[error("your cart is empty, an order cannot be placed")]
    EmptyCart,

    /// Lock-time stock check failed during checkout; the whole order is
    /// rolled back.
    #[error("not enough stock for {name}, the order cannot be placed")]
    InsufficientStock { name: String },

    /// Only pending orders can be cancelled.
    #[error("an order with status {status} can no longer be cancelled")]
    NotCancellable { status: OrderStatus },

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Returns true for absent-resource failures (HTTP 404 territory).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::ProductNotFound
                | DomainError::CartNotFound
                | DomainError::CartItemNotFound
                | DomainError::OrderNotFound
        )
    }
}
