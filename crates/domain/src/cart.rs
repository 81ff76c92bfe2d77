//! Cart mutation and viewing.
//!
//! Stock checks here are advisory only, for early feedback at the UX
//! layer. They are not safe against concurrent modification; the checkout
//! workflow's lock-and-recheck is the authority.

use common::{CartItemId, Money, ProductId, UserId};
use store::{CartLine, CommerceStore, StoreTx};

use crate::error::DomainError;

/// A cart's contents with live line totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub cart_id: common::CartId,
    pub lines: Vec<CartLine>,
    /// Sum of live line totals, computed at read time and never stored.
    pub grand_total: Money,
}

/// Result of adding a product to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartUpdate {
    pub view: CartView,
    /// True when a new line was created, false when an existing line's
    /// quantity was incremented.
    pub created: bool,
}

/// Service for manipulating a user's cart.
pub struct CartService<S: CommerceStore> {
    store: S,
}

impl<S: CommerceStore> CartService<S> {
    /// Creates a new cart service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the caller's cart, creating it lazily on first access.
    #[tracing::instrument(skip(self))]
    pub async fn view(&self, user: UserId) -> Result<CartView, DomainError> {
        let mut tx = self.store.begin().await?;
        let cart = match tx.cart_for_user(user).await? {
            Some(cart) => cart,
            None => tx.create_cart(user).await?,
        };
        let lines = tx.cart_lines(cart).await?;
        tx.commit().await?;
        Ok(assemble_view(cart, lines))
    }

    /// Adds a product to the cart, or increments its quantity if the cart
    /// already holds it.
    ///
    /// The summed quantity is re-checked against stock after the
    /// increment, so a cart can never ask for more of a product than the
    /// catalog showed at add time.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartUpdate, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity);
        }

        let mut tx = self.store.begin().await?;
        let product = tx
            .product(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound)?;
        if quantity > product.stock {
            return Err(DomainError::NotEnoughStock);
        }

        let cart = match tx.cart_for_user(user).await? {
            Some(cart) => cart,
            None => tx.create_cart(user).await?,
        };

        let created = match tx.find_cart_item(cart, product.id).await? {
            Some(existing) => {
                let summed = existing.quantity + quantity;
                if summed > product.stock {
                    return Err(DomainError::OverStock);
                }
                tx.set_cart_item_quantity(existing.id, summed).await?;
                false
            }
            None => {
                tx.insert_cart_item(cart, product.id, quantity).await?;
                true
            }
        };

        let lines = tx.cart_lines(cart).await?;
        tx.commit().await?;
        Ok(CartUpdate {
            view: assemble_view(cart, lines),
            created,
        })
    }

    /// Overwrites a cart line's quantity. A quantity of zero or less
    /// removes the line instead.
    #[tracing::instrument(skip(self))]
    pub async fn set_item_quantity(
        &self,
        user: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartView, DomainError> {
        let mut tx = self.store.begin().await?;
        let cart = tx
            .cart_for_user(user)
            .await?
            .ok_or(DomainError::CartNotFound)?;
        let item = tx
            .cart_item(cart, item_id)
            .await?
            .ok_or(DomainError::CartItemNotFound)?;

        if quantity <= 0 {
            tx.delete_cart_item(item.id).await?;
        } else {
            let product = tx
                .product(item.product_id)
                .await?
                .ok_or(DomainError::ProductNotFound)?;
            if quantity > product.stock {
                return Err(DomainError::NotEnoughStock);
            }
            tx.set_cart_item_quantity(item.id, quantity).await?;
        }

        let lines = tx.cart_lines(cart).await?;
        tx.commit().await?;
        Ok(assemble_view(cart, lines))
    }

    /// Removes a line from the cart entirely.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user: UserId,
        item_id: CartItemId,
    ) -> Result<CartView, DomainError> {
        let mut tx = self.store.begin().await?;
        let cart = tx
            .cart_for_user(user)
            .await?
            .ok_or(DomainError::CartNotFound)?;
        let item = tx
            .cart_item(cart, item_id)
            .await?
            .ok_or(DomainError::CartItemNotFound)?;

        tx.delete_cart_item(item.id).await?;
        let lines = tx.cart_lines(cart).await?;
        tx.commit().await?;
        Ok(assemble_view(cart, lines))
    }
}

fn assemble_view(cart_id: common::CartId, lines: Vec<CartLine>) -> CartView {
    let grand_total: Money = lines.iter().map(|line| line.line_total()).sum();
    CartView {
        cart_id,
        lines,
        grand_total,
    }
}
