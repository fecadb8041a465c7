//! Persistence boundary for the catalog.
//!
//! Services never talk to a database directly; they receive a [`CatalogStore`]
//! handle constructed once per process. Reads that feed a single request go
//! through the store, while writes that must land together (a review insert
//! and the product rating it changes) go through a [`CatalogTransaction`].

use std::collections::HashSet;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::categories::models::{Category, CreateCategory};
use crate::features::products::models::{CreateProduct, Product};
use crate::features::reviews::models::{CreateReview, Review};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    type Tx: CatalogTransaction;

    /// Open a transaction. Dropping it without `commit` discards its writes.
    async fn begin(&self) -> Result<Self::Tx>;

    // Categories

    /// Every active category, in creation order
    async fn list_active_categories(&self) -> Result<Vec<Category>>;

    /// Direct active children of `parent_id`, in creation order
    async fn list_active_child_categories(&self, parent_id: i64) -> Result<Vec<Category>>;

    async fn find_active_category(&self, id: i64) -> Result<Option<Category>>;

    async fn find_active_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    async fn insert_category(&self, data: CreateCategory) -> Result<Category>;

    /// Re-parent `id`. The ancestor check runs atomically with the write:
    /// `Validation` if `parent_id` is `id` itself or one of its descendants.
    async fn update_category_parent(&self, id: i64, parent_id: Option<i64>) -> Result<Category>;

    async fn deactivate_category(&self, id: i64) -> Result<()>;

    // Products

    /// Every active product, in or out of stock
    async fn list_active_products(&self) -> Result<Vec<Product>>;

    /// Active products with stock > 0
    async fn list_active_in_stock_products(&self) -> Result<Vec<Product>>;

    /// Active products with stock > 0 whose category is one of `ids`
    async fn list_active_in_stock_products_by_category_ids(
        &self,
        ids: &HashSet<i64>,
    ) -> Result<Vec<Product>>;

    async fn find_active_product(&self, id: i64) -> Result<Option<Product>>;

    async fn find_active_product_by_slug(&self, slug: &str) -> Result<Option<Product>>;

    async fn insert_product(&self, data: CreateProduct) -> Result<Product>;

    async fn deactivate_product(&self, id: i64) -> Result<()>;

    // Reviews

    async fn list_active_reviews(&self) -> Result<Vec<Review>>;

    async fn get_active_reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>>;

    async fn find_active_review(&self, id: i64) -> Result<Option<Review>>;
}

/// Unit of work spanning the review-write and rating-update pair.
///
/// Reads observe the transaction's own uncommitted writes.
#[async_trait]
pub trait CatalogTransaction: Send {
    async fn find_active_product(&mut self, id: i64) -> Result<Option<Product>>;

    /// Product row regardless of its active flag
    async fn find_product(&mut self, id: i64) -> Result<Option<Product>>;

    async fn find_active_review(&mut self, id: i64) -> Result<Option<Review>>;

    async fn get_active_reviews_for_product(&mut self, product_id: i64) -> Result<Vec<Review>>;

    /// Insert an active review and return it with its assigned id
    async fn insert_review(&mut self, data: CreateReview) -> Result<Review>;

    /// Flip an active review to inactive; `NotFound` if there is none
    async fn deactivate_review(&mut self, id: i64) -> Result<()>;

    /// `NotFound` if the product is unknown or inactive
    async fn update_product_rating(&mut self, product_id: i64, rating: f64) -> Result<()>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}
