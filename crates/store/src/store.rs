use async_trait::async_trait;
use common::{CartId, CartItemId, Money, OrderId, ProductId, UserId};

use crate::{
    Result,
    model::{CartItem, CartLine, NewProduct, Order, OrderItem, OrderStatus, Product},
};

/// Core trait for storage backends.
///
/// Every read and write happens inside a [`StoreTx`]; correctness under
/// concurrency is delegated entirely to the backend's transaction and
/// row-locking primitives. All implementations must be thread-safe.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    /// The backend's transaction type. Transactions own their resources,
    /// so they can outlive the request scope that opened them.
    type Tx: StoreTx + 'static;

    /// Opens a new transaction.
    async fn begin(&self) -> Result<Self::Tx>;
}

/// A single atomic unit of work.
///
/// Writes made through a transaction become visible only after
/// [`commit`](StoreTx::commit); dropping an uncommitted transaction rolls
/// every one of them back.
#[async_trait]
pub trait StoreTx: Send {
    // -- products --

    /// Inserts a new product and returns the stored record.
    async fn insert_product(&mut self, new: NewProduct) -> Result<Product>;

    /// Lists all products in catalog insertion order.
    async fn list_products(&mut self) -> Result<Vec<Product>>;

    /// Fetches a product by id.
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Fetches a product by id under an exclusive row lock
    /// (`SELECT ... FOR UPDATE` semantics).
    ///
    /// Concurrent transactions locking the same product serialize here:
    /// the second waits for the first's commit or rollback, then reads
    /// the settled row. This is the checkout workflow's authoritative
    /// stock read.
    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Sets a product's stock to an absolute value.
    async fn set_stock(&mut self, id: ProductId, stock: i32) -> Result<()>;

    /// Sets a product's live unit price.
    async fn set_price(&mut self, id: ProductId, price: Money) -> Result<()>;

    /// Adds `quantity` back to a product's stock as a single atomic
    /// increment (`stock = stock + n`).
    async fn restock(&mut self, id: ProductId, quantity: i32) -> Result<()>;

    // -- carts --

    /// Returns the id of the user's cart, if one exists.
    async fn cart_for_user(&mut self, user: UserId) -> Result<Option<CartId>>;

    /// Creates an empty cart for the user.
    async fn create_cart(&mut self, user: UserId) -> Result<CartId>;

    /// Returns the cart's lines joined with their products, in cart
    /// insertion order.
    async fn cart_lines(&mut self, cart: CartId) -> Result<Vec<CartLine>>;

    /// Fetches a cart item by id, scoped to the given cart.
    async fn cart_item(&mut self, cart: CartId, item: CartItemId) -> Result<Option<CartItem>>;

    /// Fetches the cart's line for a product, if present.
    async fn find_cart_item(
        &mut self,
        cart: CartId,
        product: ProductId,
    ) -> Result<Option<CartItem>>;

    /// Inserts a new cart line.
    async fn insert_cart_item(
        &mut self,
        cart: CartId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartItem>;

    /// Overwrites a cart line's quantity.
    async fn set_cart_item_quantity(&mut self, item: CartItemId, quantity: i32) -> Result<()>;

    /// Deletes a cart line.
    async fn delete_cart_item(&mut self, item: CartItemId) -> Result<()>;

    /// Deletes all of the cart's lines. The cart row itself persists.
    async fn clear_cart(&mut self, cart: CartId) -> Result<()>;

    // -- orders --

    /// Inserts an order header with status [`OrderStatus::Pending`].
    async fn insert_order(&mut self, user: UserId, total: Money) -> Result<Order>;

    /// Inserts one order line with its snapshotted unit price.
    async fn insert_order_item(
        &mut self,
        order: OrderId,
        product: ProductId,
        quantity: i32,
        price: Money,
    ) -> Result<OrderItem>;

    /// Fetches an order by id, scoped to its owner.
    async fn order(&mut self, user: UserId, order: OrderId) -> Result<Option<Order>>;

    /// Fetches an order by id under an exclusive row lock, scoped to its
    /// owner. Serializes concurrent cancellations of the same order.
    async fn order_for_update(&mut self, user: UserId, order: OrderId) -> Result<Option<Order>>;

    /// Returns the order's lines.
    async fn order_items(&mut self, order: OrderId) -> Result<Vec<OrderItem>>;

    /// Returns the user's orders, newest first.
    async fn orders_for_user(&mut self, user: UserId) -> Result<Vec<Order>>;

    /// Overwrites an order's status.
    async fn set_order_status(&mut self, order: OrderId, status: OrderStatus) -> Result<()>;

    /// Commits the transaction, making all of its writes visible.
    async fn commit(self) -> Result<()>;
}
