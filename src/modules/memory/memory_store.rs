//! In-process catalog store
//!
//! Backs the binary and the test suite. A transaction takes the state lock for
//! its whole lifetime and works on a staged copy, which gives serializable
//! isolation: the staged copy only replaces the live state on commit.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::core::store::{CatalogStore, CatalogTransaction};
use crate::features::categories::models::{Category, CreateCategory};
use crate::features::products::models::{CreateProduct, Product};
use crate::features::reviews::models::{CreateReview, Review};

use super::state::{CatalogSeed, CatalogState};

/// Mutex-guarded catalog living entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalogStore {
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: CatalogSeed) -> Result<Self> {
        let state = CatalogState::from_seed(seed)?;
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Load a seed document from a JSON file
    pub async fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::Store(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;
        let seed: CatalogSeed = serde_json::from_str(&raw).map_err(|e| {
            AppError::Validation(format!("Invalid seed file {}: {}", path.display(), e))
        })?;

        Self::from_seed(seed)
    }

    /// Make every subsequent rating update fail, to exercise rollback paths
    #[cfg(test)]
    pub(crate) async fn fail_rating_updates(&self, fail: bool) {
        self.state.lock().await.fail_rating_updates = fail;
    }

    /// Review row regardless of its active flag
    #[cfg(test)]
    pub(crate) async fn review_by_id(&self, id: i64) -> Option<Review> {
        self.state.lock().await.reviews.get(&id).cloned()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTransaction { guard, staged })
    }

    async fn list_active_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    async fn list_active_child_categories(&self, parent_id: i64) -> Result<Vec<Category>> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .values()
            .filter(|c| c.is_active && c.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn find_active_category(&self, id: i64) -> Result<Option<Category>> {
        let state = self.state.lock().await;
        Ok(state.active_category(id).cloned())
    }

    async fn find_active_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .values()
            .find(|c| c.is_active && c.slug == slug)
            .cloned())
    }

    async fn insert_category(&self, data: CreateCategory) -> Result<Category> {
        let mut state = self.state.lock().await;
        state.insert_category(data)
    }

    async fn update_category_parent(&self, id: i64, parent_id: Option<i64>) -> Result<Category> {
        let mut state = self.state.lock().await;
        state.set_category_parent(id, parent_id)
    }

    async fn deactivate_category(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        let category = state
            .categories
            .get_mut(&id)
            .filter(|c| c.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        category.is_active = false;
        Ok(())
    }

    async fn list_active_products(&self) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn list_active_in_stock_products(&self) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .values()
            .filter(|p| p.is_active && p.is_in_stock())
            .cloned()
            .collect())
    }

    async fn list_active_in_stock_products_by_category_ids(
        &self,
        ids: &HashSet<i64>,
    ) -> Result<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .values()
            .filter(|p| p.is_active && p.is_in_stock() && ids.contains(&p.category_id))
            .cloned()
            .collect())
    }

    async fn find_active_product(&self, id: i64) -> Result<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state.active_product(id).cloned())
    }

    async fn find_active_product_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .values()
            .find(|p| p.is_active && p.slug == slug)
            .cloned())
    }

    async fn insert_product(&self, data: CreateProduct) -> Result<Product> {
        let mut state = self.state.lock().await;
        state.insert_product(data)
    }

    async fn deactivate_product(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .get_mut(&id)
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))?;

        product.is_active = false;
        Ok(())
    }

    async fn list_active_reviews(&self) -> Result<Vec<Review>> {
        let state = self.state.lock().await;
        Ok(state
            .reviews
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }

    async fn get_active_reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>> {
        let state = self.state.lock().await;
        Ok(state.active_reviews_for_product(product_id))
    }

    async fn find_active_review(&self, id: i64) -> Result<Option<Review>> {
        let state = self.state.lock().await;
        Ok(state.active_review(id).cloned())
    }
}

/// Transaction over [`MemoryCatalogStore`]
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<CatalogState>,
    staged: CatalogState,
}

#[async_trait]
impl CatalogTransaction for MemoryTransaction {
    async fn find_active_product(&mut self, id: i64) -> Result<Option<Product>> {
        Ok(self.staged.active_product(id).cloned())
    }

    async fn find_product(&mut self, id: i64) -> Result<Option<Product>> {
        Ok(self.staged.products.get(&id).cloned())
    }

    async fn find_active_review(&mut self, id: i64) -> Result<Option<Review>> {
        Ok(self.staged.active_review(id).cloned())
    }

    async fn get_active_reviews_for_product(&mut self, product_id: i64) -> Result<Vec<Review>> {
        Ok(self.staged.active_reviews_for_product(product_id))
    }

    async fn insert_review(&mut self, data: CreateReview) -> Result<Review> {
        Ok(self.staged.insert_review(data))
    }

    async fn deactivate_review(&mut self, id: i64) -> Result<()> {
        let review = self
            .staged
            .reviews
            .get_mut(&id)
            .filter(|r| r.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", id)))?;

        review.is_active = false;
        Ok(())
    }

    async fn update_product_rating(&mut self, product_id: i64, rating: f64) -> Result<()> {
        #[cfg(test)]
        if self.staged.fail_rating_updates {
            return Err(AppError::Store("injected rating update failure".to_string()));
        }

        let product = self
            .staged
            .products
            .get_mut(&product_id)
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

        product.rating = rating;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let MemoryTransaction { mut guard, staged } = self;
        *guard = staged;
        debug!("Committed in-memory catalog transaction");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        debug!("Rolled back in-memory catalog transaction");
        Ok(())
    }
}
