//! PostgreSQL integration tests for the checkout and cancellation
//! workflows.
//!
//! These tests use a shared PostgreSQL container for efficiency. Each test
//! seeds its own products and users, so no table cleanup is needed between
//! tests. Run with:
//!
//! ```bash
//! cargo test -p domain --test postgres_integration
//! ```

use std::sync::Arc;

use common::{Money, UserId};
use domain::{CartService, CatalogService, DomainError, OrderService, OrderStatus};
use sqlx::PgPool;
use store::PostgresStore;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a store with a fresh pool
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

struct Shop {
    store: PostgresStore,
    orders: OrderService<PostgresStore>,
    cart: CartService<PostgresStore>,
    catalog: CatalogService<PostgresStore>,
}

async fn shop() -> Shop {
    let store = get_test_store().await;
    Shop {
        orders: OrderService::new(store.clone()),
        cart: CartService::new(store.clone()),
        catalog: CatalogService::new(store.clone()),
        store,
    }
}

#[tokio::test]
async fn checkout_commits_order_stock_and_cart_atomically() {
    let shop = shop().await;
    let a = shop
        .catalog
        .add_product("Product A".to_string(), Money::from_cents(1000), 10)
        .await
        .unwrap();
    let b = shop
        .catalog
        .add_product("Product B".to_string(), Money::from_cents(500), 10)
        .await
        .unwrap();

    let user = UserId::new();
    shop.cart.add_item(user, a.id, 2).await.unwrap();
    shop.cart.add_item(user, b.id, 1).await.unwrap();

    let placed = shop.orders.place_order(user).await.unwrap();
    assert_eq!(placed.order.total.cents(), 2500);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.items.len(), 2);

    assert_eq!(shop.catalog.product(a.id).await.unwrap().unwrap().stock, 8);
    assert_eq!(shop.catalog.product(b.id).await.unwrap().unwrap().stock, 9);
    assert!(shop.cart.view(user).await.unwrap().lines.is_empty());

    // Reload through the ledger.
    let reloaded = shop.orders.order(user, placed.order.id).await.unwrap().unwrap();
    assert_eq!(reloaded.order.id, placed.order.id);
    assert_eq!(reloaded.order.total.cents(), 2500);
    assert_eq!(reloaded.order.status, OrderStatus::Pending);
    assert_eq!(reloaded.items.len(), 2);
}

#[tokio::test]
async fn failed_checkout_rolls_back_every_write() {
    let shop = shop().await;
    let a = shop
        .catalog
        .add_product("Product A".to_string(), Money::from_cents(1000), 5)
        .await
        .unwrap();
    let b = shop
        .catalog
        .add_product("Product B".to_string(), Money::from_cents(500), 5)
        .await
        .unwrap();

    let user = UserId::new();
    shop.cart.add_item(user, a.id, 2).await.unwrap();
    shop.cart.add_item(user, b.id, 4).await.unwrap();

    // Drain B's stock behind the cart's back.
    shop.catalog
        .update_product(b.id, domain::ProductUpdate::stock(1))
        .await
        .unwrap();

    let err = shop.orders.place_order(user).await.unwrap_err();
    assert!(matches!(err, DomainError::InsufficientStock { ref name } if name == "Product B"));

    // No order, no stock movement, cart intact.
    assert!(shop.orders.orders(user).await.unwrap().is_empty());
    assert_eq!(shop.catalog.product(a.id).await.unwrap().unwrap().stock, 5);
    assert_eq!(shop.catalog.product(b.id).await.unwrap().unwrap().stock, 1);
    assert_eq!(shop.cart.view(user).await.unwrap().lines.len(), 2);
}

#[tokio::test]
async fn concurrent_checkouts_serialize_on_the_product_row() {
    let shop = shop().await;
    let product = shop
        .catalog
        .add_product("Last Widget".to_string(), Money::from_cents(1000), 1)
        .await
        .unwrap();

    let alice = UserId::new();
    let bob = UserId::new();
    shop.cart.add_item(alice, product.id, 1).await.unwrap();
    shop.cart.add_item(bob, product.id, 1).await.unwrap();

    let orders_a = OrderService::new(shop.store.clone());
    let orders_b = OrderService::new(shop.store.clone());
    let (a, b) = tokio::join!(
        tokio::spawn(async move { orders_a.place_order(alice).await }),
        tokio::spawn(async move { orders_b.place_order(bob).await }),
    );
    let results = [a.unwrap(), b.unwrap()];

    assert_eq!(
        results.iter().filter(|r| r.is_ok()).count(),
        1,
        "exactly one checkout must win the row lock"
    );
    assert!(results.iter().any(|r| matches!(
        r,
        Err(DomainError::InsufficientStock { .. })
    )));

    let remaining = shop
        .catalog
        .product(product.id)
        .await
        .unwrap()
        .unwrap()
        .stock;
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn cancel_restores_stock_and_is_one_way() {
    let shop = shop().await;
    let product = shop
        .catalog
        .add_product("Product A".to_string(), Money::from_cents(1000), 10)
        .await
        .unwrap();

    let user = UserId::new();
    shop.cart.add_item(user, product.id, 2).await.unwrap();
    let placed = shop.orders.place_order(user).await.unwrap();
    assert_eq!(
        shop.catalog.product(product.id).await.unwrap().unwrap().stock,
        8
    );

    let cancelled = shop.orders.cancel_order(user, placed.order.id).await.unwrap();
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(
        shop.catalog.product(product.id).await.unwrap().unwrap().stock,
        10
    );

    // Second cancel fails and moves no stock.
    let err = shop
        .orders
        .cancel_order(user, placed.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotCancellable { .. }));
    assert_eq!(
        shop.catalog.product(product.id).await.unwrap().unwrap().stock,
        10
    );
}

#[tokio::test]
async fn accounting_identity_survives_a_mixed_history() {
    let shop = shop().await;
    let baseline = 20;
    let product = shop
        .catalog
        .add_product("Product A".to_string(), Money::from_cents(250), baseline)
        .await
        .unwrap();

    let user = UserId::new();
    let mut order_ids = Vec::new();
    for quantity in [3, 5, 2] {
        shop.cart.add_item(user, product.id, quantity).await.unwrap();
        let placed = shop.orders.place_order(user).await.unwrap();
        order_ids.push(placed.order.id);
    }
    shop.orders.cancel_order(user, order_ids[1]).await.unwrap();

    let committed: i32 = shop
        .orders
        .orders(user)
        .await
        .unwrap()
        .iter()
        .filter(|p| p.order.status != OrderStatus::Cancelled)
        .flat_map(|p| p.items.iter())
        .map(|i| i.quantity)
        .sum();
    let stock = shop
        .catalog
        .product(product.id)
        .await
        .unwrap()
        .unwrap()
        .stock;

    assert_eq!(stock + committed, baseline);
}
