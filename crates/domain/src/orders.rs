//! Order placement and cancellation.
//!
//! Both workflows run inside a single storage transaction. Checkout is
//! the only writer that moves stock from available to committed;
//! cancellation is the only writer that moves it back.

use common::{Money, OrderId, UserId};
use store::{CommerceStore, Order, OrderItem, OrderStatus, StoreTx};

use crate::error::DomainError;

/// An order header together with its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Service for placing, cancelling, and reading orders.
pub struct OrderService<S: CommerceStore> {
    store: S,
}

impl<S: CommerceStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Converts the caller's cart into an order, committing stock.
    ///
    /// The whole operation is one transaction: the order header is
    /// created from live prices, then each cart line locks its product
    /// row, re-checks stock under the lock, snapshots the current unit
    /// price into an order item, and decrements stock. The cart is
    /// cleared last. Any failure rolls the entire transaction back: no
    /// partial order and no stock mutation survive.
    #[tracing::instrument(skip(self))]
    pub async fn place_order(&self, user: UserId) -> Result<PlacedOrder, DomainError> {
        let started = std::time::Instant::now();
        let mut tx = self.store.begin().await?;

        let cart = tx
            .cart_for_user(user)
            .await?
            .ok_or(DomainError::CartNotFound)?;
        let lines = tx.cart_lines(cart).await?;
        if lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        // Total from live prices, computed before anything is mutated.
        let total: Money = lines.iter().map(|line| line.line_total()).sum();
        let order = tx.insert_order(user, total).await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = tx
                .product_for_update(line.product.id)
                .await?
                .ok_or(DomainError::ProductNotFound)?;

            // The cart-time stock check was advisory; this one, under the
            // row lock, is authoritative.
            if product.stock < line.item.quantity {
                metrics::counter!("checkout_failures_total").increment(1);
                return Err(DomainError::InsufficientStock { name: product.name });
            }

            let item = tx
                .insert_order_item(order.id, product.id, line.item.quantity, product.price)
                .await?;
            tx.set_stock(product.id, product.stock - line.item.quantity)
                .await?;
            items.push(item);
        }

        tx.clear_cart(cart).await?;
        tx.commit().await?;

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());
        tracing::info!(order_id = %order.id, total = %order.total, "order placed");

        Ok(PlacedOrder { order, items })
    }

    /// Cancels a pending order owned by the caller, restoring stock.
    ///
    /// One transaction: the order row is locked, the status re-checked
    /// under the lock (so a concurrent double-cancel loses cleanly), then
    /// the status flips to Cancelled and every line's quantity is added
    /// back to its product's stock as an atomic increment.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        user: UserId,
        order_id: OrderId,
    ) -> Result<PlacedOrder, DomainError> {
        let mut tx = self.store.begin().await?;

        let order = tx
            .order_for_update(user, order_id)
            .await?
            .ok_or(DomainError::OrderNotFound)?;
        if !order.status.can_cancel() {
            return Err(DomainError::NotCancellable {
                status: order.status,
            });
        }

        tx.set_order_status(order.id, OrderStatus::Cancelled).await?;
        let items = tx.order_items(order.id).await?;
        for item in &items {
            tx.restock(item.product_id, item.quantity).await?;
        }
        tx.commit().await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order.id, "order cancelled");

        Ok(PlacedOrder {
            order: Order {
                status: OrderStatus::Cancelled,
                ..order
            },
            items,
        })
    }

    /// Loads one of the caller's orders with its lines.
    ///
    /// Returns None for absent orders and for orders owned by someone
    /// else; callers cannot distinguish the two.
    #[tracing::instrument(skip(self))]
    pub async fn order(
        &self,
        user: UserId,
        order_id: OrderId,
    ) -> Result<Option<PlacedOrder>, DomainError> {
        let mut tx = self.store.begin().await?;
        let Some(order) = tx.order(user, order_id).await? else {
            return Ok(None);
        };
        let items = tx.order_items(order.id).await?;
        tx.commit().await?;
        Ok(Some(PlacedOrder { order, items }))
    }

    /// Lists the caller's orders with their lines, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn orders(&self, user: UserId) -> Result<Vec<PlacedOrder>, DomainError> {
        let mut tx = self.store.begin().await?;
        let orders = tx.orders_for_user(user).await?;
        let mut placed = Vec::with_capacity(orders.len());
        for order in orders {
            let items = tx.order_items(order.id).await?;
            placed.push(PlacedOrder { order, items });
        }
        tx.commit().await?;
        Ok(placed)
    }
}
