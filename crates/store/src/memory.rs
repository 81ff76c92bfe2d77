use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, CartItemId, Money, OrderId, ProductId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    Result,
    model::{Cart, CartItem, CartLine, NewProduct, Order, OrderItem, OrderStatus, Product},
    store::{CommerceStore, StoreTx},
};

#[derive(Clone, Default)]
struct MemState {
    products: Vec<Product>,
    carts: Vec<Cart>,
    cart_items: Vec<CartItem>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
}

/// In-memory store implementation for testing.
///
/// Provides the same interface as the PostgreSQL implementation. A
/// transaction holds the store-wide lock for its whole lifetime, a
/// coarser serialization than row locks, so every interleaving the
/// Postgres backend permits under `FOR UPDATE` is also serialized here.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of order headers currently stored.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

/// One open in-memory transaction.
///
/// Writes go to a staged clone of the state; commit swaps the clone in,
/// dropping without commit discards it.
pub struct InMemoryTx {
    guard: OwnedMutexGuard<MemState>,
    staged: MemState,
}

#[async_trait]
impl CommerceStore for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<InMemoryTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTx { guard, staged })
    }
}

#[async_trait]
impl StoreTx for InMemoryTx {
    async fn insert_product(&mut self, new: NewProduct) -> Result<Product> {
        let product = Product {
            id: ProductId::new(),
            name: new.name,
            price: new.price,
            stock: new.stock,
            created_at: Utc::now(),
        };
        self.staged.products.push(product.clone());
        Ok(product)
    }

    async fn list_products(&mut self) -> Result<Vec<Product>> {
        Ok(self.staged.products.clone())
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.staged.products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>> {
        // The store-wide transaction lock already serializes access.
        self.product(id).await
    }

    async fn set_stock(&mut self, id: ProductId, stock: i32) -> Result<()> {
        if let Some(product) = self.staged.products.iter_mut().find(|p| p.id == id) {
            product.stock = stock;
        }
        Ok(())
    }

    async fn set_price(&mut self, id: ProductId, price: Money) -> Result<()> {
        if let Some(product) = self.staged.products.iter_mut().find(|p| p.id == id) {
            product.price = price;
        }
        Ok(())
    }

    async fn restock(&mut self, id: ProductId, quantity: i32) -> Result<()> {
        if let Some(product) = self.staged.products.iter_mut().find(|p| p.id == id) {
            product.stock += quantity;
        }
        Ok(())
    }

    async fn cart_for_user(&mut self, user: UserId) -> Result<Option<CartId>> {
        Ok(self
            .staged
            .carts
            .iter()
            .find(|c| c.user_id == user)
            .map(|c| c.id))
    }

    async fn create_cart(&mut self, user: UserId) -> Result<CartId> {
        let cart = Cart {
            id: CartId::new(),
            user_id: user,
            created_at: Utc::now(),
        };
        self.staged.carts.push(cart);
        Ok(cart.id)
    }

    async fn cart_lines(&mut self, cart: CartId) -> Result<Vec<CartLine>> {
        // Insertion order of cart_items is the cart iteration order.
        Ok(self
            .staged
            .cart_items
            .iter()
            .filter(|item| item.cart_id == cart)
            .filter_map(|item| {
                let product = self
                    .staged
                    .products
                    .iter()
                    .find(|p| p.id == item.product_id)?;
                Some(CartLine {
                    item: item.clone(),
                    product: product.clone(),
                })
            })
            .collect())
    }

    async fn cart_item(&mut self, cart: CartId, item: CartItemId) -> Result<Option<CartItem>> {
        Ok(self
            .staged
            .cart_items
            .iter()
            .find(|i| i.id == item && i.cart_id == cart)
            .cloned())
    }

    async fn find_cart_item(
        &mut self,
        cart: CartId,
        product: ProductId,
    ) -> Result<Option<CartItem>> {
        Ok(self
            .staged
            .cart_items
            .iter()
            .find(|i| i.cart_id == cart && i.product_id == product)
            .cloned())
    }

    async fn insert_cart_item(
        &mut self,
        cart: CartId,
        product: ProductId,
        quantity: i32,
    ) -> Result<CartItem> {
        let item = CartItem {
            id: CartItemId::new(),
            cart_id: cart,
            product_id: product,
            quantity,
            created_at: Utc::now(),
        };
        self.staged.cart_items.push(item.clone());
        Ok(item)
    }

    async fn set_cart_item_quantity(&mut self, item: CartItemId, quantity: i32) -> Result<()> {
        if let Some(stored) = self.staged.cart_items.iter_mut().find(|i| i.id == item) {
            stored.quantity = quantity;
        }
        Ok(())
    }

    async fn delete_cart_item(&mut self, item: CartItemId) -> Result<()> {
        self.staged.cart_items.retain(|i| i.id != item);
        Ok(())
    }

    async fn clear_cart(&mut self, cart: CartId) -> Result<()> {
        self.staged.cart_items.retain(|i| i.cart_id != cart);
        Ok(())
    }

    async fn insert_order(&mut self, user: UserId, total: Money) -> Result<Order> {
        let order = Order {
            id: OrderId::new(),
            user_id: user,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        self.staged.orders.push(order.clone());
        Ok(order)
    }

    async fn insert_order_item(
        &mut self,
        order: OrderId,
        product: ProductId,
        quantity: i32,
        price: Money,
    ) -> Result<OrderItem> {
        let item = OrderItem {
            order_id: order,
            product_id: product,
            quantity,
            price,
        };
        self.staged.order_items.push(item.clone());
        Ok(item)
    }

    async fn order(&mut self, user: UserId, order: OrderId) -> Result<Option<Order>> {
        Ok(self
            .staged
            .orders
            .iter()
            .find(|o| o.id == order && o.user_id == user)
            .cloned())
    }

    async fn order_for_update(&mut self, user: UserId, order: OrderId) -> Result<Option<Order>> {
        self.order(user, order).await
    }

    async fn order_items(&mut self, order: OrderId) -> Result<Vec<OrderItem>> {
        Ok(self
            .staged
            .order_items
            .iter()
            .filter(|i| i.order_id == order)
            .cloned()
            .collect())
    }

    async fn orders_for_user(&mut self, user: UserId) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .staged
            .orders
            .iter()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect();
        orders.reverse(); // newest first, matching the Postgres ordering
        Ok(orders)
    }

    async fn set_order_status(&mut self, order: OrderId, status: OrderStatus) -> Result<()> {
        if let Some(stored) = self.staged.orders.iter_mut().find(|o| o.id == order) {
            stored.status = status;
        }
        Ok(())
    }

    async fn commit(mut self) -> Result<()> {
        *self.guard = self.staged;
        Ok(())
    }
}
