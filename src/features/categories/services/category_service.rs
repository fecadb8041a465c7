use std::sync::Arc;

use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::store::CatalogStore;
use crate::features::categories::dtos::{CategoryResponseDto, CategoryTreeDto, CreateCategoryDto};
use crate::features::categories::models::{Category, CreateCategory};
use crate::features::categories::services::{group_by_category, CategoryIndex, CategoryTreeBuilder};
use crate::features::users::models::{Role, User};
use crate::shared::validation::slugify;

/// Service for category operations
pub struct CategoryService<S> {
    store: Arc<S>,
}

impl<S: CatalogStore> CategoryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// List all active categories (flat list)
    pub async fn list(&self) -> Result<Vec<CategoryResponseDto>> {
        let categories = self.store.list_active_categories().await.map_err(|e| {
            tracing::error!("Failed to list categories: {:?}", e);
            e
        })?;

        Ok(categories.into_iter().map(|c| c.into()).collect())
    }

    /// List all active categories as tree structure, without products
    pub async fn list_tree(&self) -> Result<Vec<CategoryTreeDto>> {
        let index = self.load_index().await?;
        CategoryTreeBuilder::new(&index).build_forest()
    }

    /// Get category by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryResponseDto> {
        self.find_by_slug(slug).await.map(|c| c.into())
    }

    /// Direct active subcategories of the category identified by `slug`
    pub async fn subcategories(&self, slug: &str) -> Result<Vec<CategoryResponseDto>> {
        let category = self.find_by_slug(slug).await?;
        let children = self.store.list_active_child_categories(category.id).await?;

        Ok(children.into_iter().map(|c| c.into()).collect())
    }

    /// Category `slug` with its whole subtree and the active, in-stock
    /// products filed under each node
    pub async fn products_tree(&self, slug: &str) -> Result<CategoryTreeDto> {
        let root = self.find_by_slug(slug).await?;
        let index = self.load_index().await?;
        let builder = CategoryTreeBuilder::new(&index);

        let ids = builder.collect_descendant_ids(root.id)?;
        let products = self
            .store
            .list_active_in_stock_products_by_category_ids(&ids)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list products for category '{}': {:?}", slug, e);
                e
            })?;

        builder.build_tree(root.id, group_by_category(products))
    }

    /// Create a category. Only administrators may do this.
    pub async fn create(&self, actor: &User, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        actor.require(Role::Administrator)?;
        dto.validate()?;

        if let Some(parent_id) = dto.parent_id {
            self.find_by_id(parent_id).await?;
        }

        let slug = slugify(&dto.name)?;
        let category = self
            .store
            .insert_category(CreateCategory {
                parent_id: dto.parent_id,
                name: dto.name,
                slug,
            })
            .await?;

        tracing::info!("Category {} ('{}') created by user {}", category.id, category.slug, actor.id);
        Ok(category.into())
    }

    /// Re-parent a category. Moves that would make the category its own
    /// ancestor are rejected by the store in the same step as the write, so
    /// concurrent moves cannot combine into a cycle.
    pub async fn move_to(
        &self,
        actor: &User,
        id: i64,
        new_parent_id: Option<i64>,
    ) -> Result<CategoryResponseDto> {
        actor.require(Role::Administrator)?;
        self.find_by_id(id).await?;
        if let Some(parent_id) = new_parent_id {
            self.find_by_id(parent_id).await?;
        }

        let category = self
            .store
            .update_category_parent(id, new_parent_id)
            .await
            .map_err(|e| {
                if matches!(e, AppError::Validation(_)) {
                    tracing::warn!("Rejected moving category {} under {:?}: {}", id, new_parent_id, e);
                }
                e
            })?;

        tracing::info!("Category {} moved under {:?}", id, new_parent_id);
        Ok(category.into())
    }

    /// Soft-delete a category. Categories that still have active children
    /// cannot be deactivated.
    pub async fn deactivate(&self, actor: &User, id: i64) -> Result<()> {
        actor.require(Role::Administrator)?;
        self.find_by_id(id).await?;

        let children = self.store.list_active_child_categories(id).await?;
        if !children.is_empty() {
            return Err(AppError::Conflict(format!(
                "Category {} still has {} active subcategories",
                id,
                children.len()
            )));
        }

        self.store.deactivate_category(id).await?;
        tracing::info!("Category {} deactivated by user {}", id, actor.id);
        Ok(())
    }

    async fn load_index(&self) -> Result<CategoryIndex> {
        let categories = self.store.list_active_categories().await.map_err(|e| {
            tracing::error!("Failed to load categories: {:?}", e);
            e
        })?;

        Ok(CategoryIndex::build(categories))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Category> {
        self.store
            .find_active_category_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))
    }

    async fn find_by_id(&self, id: i64) -> Result<Category> {
        self.store
            .find_active_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }
}
