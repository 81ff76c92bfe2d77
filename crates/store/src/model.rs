//! Persisted record types.

use chrono::{DateTime, Utc};
use common::{CartId, CartItemId, Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A sellable catalog product.
///
/// `stock` is decremented by checkout and incremented by cancellation and
/// is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Live unit price. Orders snapshot this at checkout time.
    pub price: Money,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: i32,
}

/// A user's cart. Created lazily on first access and kept (empty) after
/// checkout clears its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// One line of a cart. A `(cart, product)` pair is unique; adding the same
/// product again increments `quantity` instead of duplicating the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// A cart item joined with its product, for price math and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
}

impl CartLine {
    /// Line total at the product's *current* price. Never stored; order
    /// items snapshot their own price instead.
    pub fn line_total(&self) -> Money {
        self.product.price.multiply(self.item.quantity)
    }
}

/// The state of a placed order.
///
/// The only modeled transition is Pending to Cancelled. Fulfillment
/// states are not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed and awaiting whatever comes next; the only cancellable state.
    #[default]
    Pending,

    /// Cancelled by its owner; stock has been restored (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order can still be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An order header. Immutable after checkout except for `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// Sum of line subtotals, computed once at checkout and stored.
    pub total: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A line of a placed order.
///
/// `price` is the unit price at the time of purchase and never changes,
/// unlike a cart line which always reads the live product price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Money,
}

impl OrderItem {
    /// Subtotal for this line at its snapshotted price.
    pub fn subtotal(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price_cents: i64, stock: i32) -> Product {
        Product {
            id: ProductId::new(),
            name: "Widget".to_string(),
            price: Money::from_cents(price_cents),
            stock,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cart_line_total_uses_live_price() {
        let product = product(1000, 10);
        let line = CartLine {
            item: CartItem {
                id: CartItemId::new(),
                cart_id: CartId::new(),
                product_id: product.id,
                quantity: 3,
                created_at: Utc::now(),
            },
            product,
        };
        assert_eq!(line.line_total().cents(), 3000);
    }

    #[test]
    fn order_item_subtotal_uses_snapshot_price() {
        let item = OrderItem {
            order_id: OrderId::new(),
            product_id: ProductId::new(),
            quantity: 2,
            price: Money::from_cents(550),
        };
        assert_eq!(item.subtotal().cents(), 1100);
    }

    #[test]
    fn default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn only_pending_can_cancel() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [OrderStatus::Pending, OrderStatus::Cancelled] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }

    #[test]
    fn status_serde_matches_storage_strings() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }
}
