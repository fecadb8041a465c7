use std::sync::Arc;

use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::store::CatalogStore;
use crate::features::categories::services::{CategoryIndex, CategoryTreeBuilder};
use crate::features::products::dtos::{CreateProductDto, ProductResponseDto};
use crate::features::products::models::{CreateProduct, Product};
use crate::features::users::models::{Role, User};
use crate::shared::constants::MISSING_IMAGE_URL;
use crate::shared::validation::slugify;

/// Service for product operations
pub struct ProductService<S> {
    store: Arc<S>,
}

impl<S: CatalogStore> ProductService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All active, in-stock products
    pub async fn list(&self) -> Result<Vec<ProductResponseDto>> {
        let products = self.store.list_active_in_stock_products().await.map_err(|e| {
            tracing::error!("Failed to list products: {:?}", e);
            e
        })?;

        Ok(products.into_iter().map(|p| p.into()).collect())
    }

    /// Get product by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<ProductResponseDto> {
        self.store
            .find_active_product_by_slug(slug)
            .await?
            .map(|p| p.into())
            .ok_or_else(|| AppError::NotFound(format!("Product '{}' not found", slug)))
    }

    /// Active, in-stock products of category `slug` and all its subcategories
    pub async fn by_category(&self, slug: &str) -> Result<Vec<ProductResponseDto>> {
        let category = self
            .store
            .find_active_category_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))?;

        let index = CategoryIndex::build(self.store.list_active_categories().await?);
        let ids = CategoryTreeBuilder::new(&index).collect_descendant_ids(category.id)?;

        let products = self
            .store
            .list_active_in_stock_products_by_category_ids(&ids)
            .await?;

        Ok(products.into_iter().map(|p| p.into()).collect())
    }

    /// Create a product owned by `actor`. Suppliers and administrators only.
    pub async fn create(&self, actor: &User, dto: CreateProductDto) -> Result<ProductResponseDto> {
        actor.require_any(&[Role::Supplier, Role::Administrator])?;
        dto.validate()?;

        self.store
            .find_active_category(dto.category_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Category {} does not exist or is not active",
                    dto.category_id
                ))
            })?;

        let slug = slugify(&dto.name)?;
        let image_url = dto
            .image_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| MISSING_IMAGE_URL.to_string());

        let product = self
            .store
            .insert_product(CreateProduct {
                name: dto.name,
                slug,
                description: dto.description,
                price: non_negative(dto.price, "price")?,
                image_url,
                stock: non_negative(dto.stock, "stock")?,
                category_id: dto.category_id,
                supplier_id: actor.id,
            })
            .await?;

        tracing::info!("Product {} ('{}') created by user {}", product.id, product.slug, actor.id);
        Ok(product.into())
    }

    /// Soft-delete a product. Allowed for its supplier and for administrators.
    pub async fn deactivate(&self, actor: &User, id: i64) -> Result<()> {
        actor.require_any(&[Role::Supplier, Role::Administrator])?;
        let product = self.find_by_id(id).await?;

        if !actor.is_admin() && product.supplier_id != actor.id {
            return Err(AppError::Forbidden(format!(
                "Product {} belongs to another supplier",
                id
            )));
        }

        self.store.deactivate_product(id).await?;
        tracing::info!("Product {} deactivated by user {}", id, actor.id);
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Product> {
        self.store
            .find_active_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", id)))
    }
}

fn non_negative(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| AppError::Validation(format!("{} must not be negative", field)))
}
