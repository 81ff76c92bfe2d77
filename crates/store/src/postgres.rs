use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, CartItemId, Money, OrderId, ProductId, UserId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    model::{CartItem, CartLine, NewProduct, Order, OrderItem, OrderStatus, Product},
    store::{CommerceStore, StoreTx},
};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

/// One open PostgreSQL transaction. Rolls back on drop unless committed.
pub struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_cart_item(row: &PgRow) -> Result<CartItem> {
    Ok(CartItem {
        id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
        cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity: row.try_get("quantity")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_order(row: &PgRow) -> Result<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        total: Money::from_cents(row.try_get("total_cents")?),
        status: OrderStatus::parse(&status).ok_or(StoreError::InvalidStatus(status))?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_order_item(row: &PgRow) -> Result<OrderItem> {
    Ok(OrderItem {
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        quantity: row.try_get("quantity")?,
        price: Money::from_cents(row.try_get("price_cents")?),
    })
}

#[async_trait]
impl CommerceStore for PostgresStore {
    type Tx = PostgresTx;

    async fn begin(&self) -> Result<PostgresTx> {
        Ok(PostgresTx {
            tx: self.pool.begin().await?,
        })
    }
}

#[async_trait]
impl StoreTx for PostgresTx {
    async fn insert_product(&mut self, new: NewProduct) -> Result<Product> {
        let product = Product {
            id: ProductId::new(),
            name: new.name,
            price: new.price,
            stock: new.stock,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.stock)
        .bind(product.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(product)
    }

    async fn list_products(&mut self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, price_cents, stock, created_at
            FROM products
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price_cents, stock, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn product_for_update(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price_cents, stock, created_at
            FROM products
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn set_stock(&mut self, id: ProductId, stock: i32) -> Result<()> {
        sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(stock)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn set_price(&mut self, id: ProductId, price: Money) -> Result<()> {
        sqlx::query("UPDATE products SET price_cents = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(price.cents())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn restock(&mut self, id: ProductId, quantity: i32) -> Result<()> {
        sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn cart_for_user(&mut self, user: UserId) -> Result<Option<CartId>> {
        let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = $1")
            .bind(user.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(id.map(CartId::from_uuid))
    }

    async fn create_cart(&mut self, user: UserId) -> Result<CartId> {
        let id = CartId::new();
        sqlx::query("INSERT INTO carts (id, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(id.as_uuid())
            .bind(user.as_uuid())
            .bind(Utc::now())
            .execute(&mut *self.tx)
            .await?;
        Ok(id)
    }

    async fn cart_lines(&mut self, cart: CartId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT ci.id AS item_id, ci.cart_id, ci.product_id, ci.quantity,
                   ci.created_at AS item_created_at,
                   p.name, p.price_cents, p.stock, p.created_at AS product_created_at
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at ASC, ci.id ASC
            "#,
        )
        .bind(cart.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CartLine {
                    item: CartItem {
                        id: CartItemId::from_uuid(row.try_get::<Uuid, _>("item_id")?),
                        cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
                        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                        quantity: row.try_get("quantity")?,
                        created_at: row.try_get("item_created_at")?,
                    },
                    product: Product {
                        id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                        name: row.try_get("name")?,
                        price: Money::from_cents(row.try_get("price_cents")?),
                        stock: row.try_get("stock")?,
                        created_at: row.try_get("product_created_at")?,
                    },
                })
            })
            .collect()
    }

    async fn cart_item(&mut self, cart: CartId, item: CartItemId) -> Result<Option<CartItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, cart_id, product_id, quantity, created_at
            FROM cart_items
            WHERE id = $1 AND cart_id = $2
            "#,
        )
        .bind(item.as_uuid())
        .bind(cart.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_cart_item).transpose()
    }

    async fn find_cart_item(
        &mut self,
        cart: CartId,
        product: ProductId,
    ) -> Result<Option<CartItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, cart_id, product_id, quantity, created_at
            FROM cart_items
            WHERE cart_id = $1 AND product_id = $2
            "#,
        )
        .bind(cart.as_uuid())
        .bind(product.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_cart_item).transpose()
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

        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.cart_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity)
        .bind(item.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(item)
    }

    async fn set_cart_item_quantity(&mut self, item: CartItemId, quantity: i32) -> Result<()> {
        sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
            .bind(item.as_uuid())
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn delete_cart_item(&mut self, item: CartItemId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item.as_uuid())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn clear_cart(&mut self, cart: CartId) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.as_uuid())
            .execute(&mut *self.tx)
            .await?;
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

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.total.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(order)
    }

    async fn insert_order_item(
        &mut self,
        order: OrderId,
        product: ProductId,
        quantity: i32,
        price: Money,
    ) -> Result<OrderItem> {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, price_cents)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.as_uuid())
        .bind(product.as_uuid())
        .bind(quantity)
        .bind(price.cents())
        .execute(&mut *self.tx)
        .await?;

        Ok(OrderItem {
            order_id: order,
            product_id: product,
            quantity,
            price,
        })
    }

    async fn order(&mut self, user: UserId, order: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_cents, status, created_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(order.as_uuid())
        .bind(user.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn order_for_update(&mut self, user: UserId, order: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_cents, status, created_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(order.as_uuid())
        .bind(user.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_order).transpose()
    }

    async fn order_items(&mut self, order: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, price_cents
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(order.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(row_to_order_item).collect()
    }

    async fn orders_for_user(&mut self, user: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total_cents, status, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter().map(row_to_order).collect()
    }

    async fn set_order_status(&mut self, order: OrderId, status: OrderStatus) -> Result<()> {
        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order.as_uuid())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
