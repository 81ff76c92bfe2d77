//! Thin product catalog CRUD.
//!
//! The catalog is a collaborator of the checkout core: simple data access
//! with input validation, no search or filtering.

use common::{Money, ProductId};
use store::{CommerceStore, NewProduct, Product, StoreTx};

use crate::error::DomainError;

/// A partial product update. Unset fields are left unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductUpdate {
    pub price: Option<Money>,
    pub stock: Option<i32>,
}

impl ProductUpdate {
    /// Update only the live unit price.
    pub fn price(price: Money) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }

    /// Update only the stock count.
    pub fn stock(stock: i32) -> Self {
        Self {
            stock: Some(stock),
            ..Self::default()
        }
    }
}

/// Service for managing catalog products.
pub struct CatalogService<S: CommerceStore> {
    store: S,
}

impl<S: CommerceStore> CatalogService<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a product to the catalog.
    #[tracing::instrument(skip(self))]
    pub async fn add_product(
        &self,
        name: String,
        price: Money,
        stock: i32,
    ) -> Result<Product, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidProductName);
        }
        if price.is_negative() {
            return Err(DomainError::InvalidPrice);
        }
        if stock < 0 {
            return Err(DomainError::InvalidStock);
        }

        let mut tx = self.store.begin().await?;
        let product = tx.insert_product(NewProduct { name, price, stock }).await?;
        tx.commit().await?;
        tracing::info!(product_id = %product.id, "product added");
        Ok(product)
    }

    /// Applies a partial update to a product's live price and/or stock.
    #[tracing::instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, DomainError> {
        if let Some(price) = update.price
            && price.is_negative()
        {
            return Err(DomainError::InvalidPrice);
        }
        if let Some(stock) = update.stock
            && stock < 0
        {
            return Err(DomainError::InvalidStock);
        }

        let mut tx = self.store.begin().await?;
        let mut product = tx.product(id).await?.ok_or(DomainError::ProductNotFound)?;
        if let Some(price) = update.price {
            tx.set_price(id, price).await?;
            product.price = price;
        }
        if let Some(stock) = update.stock {
            tx.set_stock(id, stock).await?;
            product.stock = stock;
        }
        tx.commit().await?;
        Ok(product)
    }

    /// Lists all products.
    #[tracing::instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, DomainError> {
        let mut tx = self.store.begin().await?;
        let products = tx.list_products().await?;
        tx.commit().await?;
        Ok(products)
    }

    /// Fetches a product by id.
    #[tracing::instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, DomainError> {
        let mut tx = self.store.begin().await?;
        let product = tx.product(id).await?;
        tx.commit().await?;
        Ok(product)
    }
}
