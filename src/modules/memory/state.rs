use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CreateCategory};
use crate::features::products::models::{CreateProduct, Product};
use crate::features::reviews::models::{CreateReview, Review};
use crate::features::reviews::services::validate_grade;

/// JSON document used to preload the in-memory store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// Whole catalog held by the in-memory store. Keyed by id so that iteration
/// yields rows in creation order.
#[derive(Debug, Clone, Default)]
pub(super) struct CatalogState {
    pub categories: BTreeMap<i64, Category>,
    pub products: BTreeMap<i64, Product>,
    pub reviews: BTreeMap<i64, Review>,
    next_category_id: i64,
    next_product_id: i64,
    next_review_id: i64,
    #[cfg(test)]
    pub fail_rating_updates: bool,
}

impl CatalogState {
    pub fn from_seed(seed: CatalogSeed) -> Result<Self> {
        let mut state = Self::default();

        for category in seed.categories {
            let id = category.id;
            if state.categories.insert(id, category).is_some() {
                return Err(AppError::Conflict(format!("Duplicate category id {}", id)));
            }
        }
        for product in seed.products {
            let id = product.id;
            if !state.categories.contains_key(&product.category_id) {
                return Err(AppError::Validation(format!(
                    "Product {} references unknown category {}",
                    id, product.category_id
                )));
            }
            if state.products.insert(id, product).is_some() {
                return Err(AppError::Conflict(format!("Duplicate product id {}", id)));
            }
        }
        for review in seed.reviews {
            let id = review.id;
            if !state.products.contains_key(&review.product_id) {
                return Err(AppError::Validation(format!(
                    "Review {} references unknown product {}",
                    id, review.product_id
                )));
            }
            validate_grade(review.grade)?;
            if state.reviews.insert(id, review).is_some() {
                return Err(AppError::Conflict(format!("Duplicate review id {}", id)));
            }
        }

        state.next_category_id = next_id(&state.categories);
        state.next_product_id = next_id(&state.products);
        state.next_review_id = next_id(&state.reviews);

        Ok(state)
    }

    pub fn active_category(&self, id: i64) -> Option<&Category> {
        self.categories.get(&id).filter(|c| c.is_active)
    }

    pub fn active_product(&self, id: i64) -> Option<&Product> {
        self.products.get(&id).filter(|p| p.is_active)
    }

    pub fn active_review(&self, id: i64) -> Option<&Review> {
        self.reviews.get(&id).filter(|r| r.is_active)
    }

    pub fn active_reviews_for_product(&self, product_id: i64) -> Vec<Review> {
        self.reviews
            .values()
            .filter(|r| r.is_active && r.product_id == product_id)
            .cloned()
            .collect()
    }

    /// Point `id` at `parent_id`, refusing any parent whose ancestor chain
    /// already passes through `id`. Inactive rows count: they still link the
    /// chain.
    pub fn set_category_parent(&mut self, id: i64, parent_id: Option<i64>) -> Result<Category> {
        if self.active_category(id).is_none() {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        if let Some(parent_id) = parent_id {
            if self.active_category(parent_id).is_none() {
                return Err(AppError::NotFound(format!("Category {} not found", parent_id)));
            }

            let mut seen = HashSet::new();
            let mut cursor = Some(parent_id);
            while let Some(current) = cursor {
                if current == id {
                    return Err(AppError::Validation(format!(
                        "Category {} cannot be moved under its own descendant {}",
                        id, parent_id
                    )));
                }
                if !seen.insert(current) {
                    // Existing loop above the new parent that does not include `id`
                    return Err(AppError::Consistency(format!(
                        "Category {} sits on a cyclic ancestor chain",
                        current
                    )));
                }
                cursor = self.categories.get(&current).and_then(|c| c.parent_id);
            }
        }

        match self.categories.get_mut(&id) {
            Some(category) => {
                category.parent_id = parent_id;
                Ok(category.clone())
            }
            None => Err(AppError::NotFound(format!("Category {} not found", id))),
        }
    }

    pub fn insert_category(&mut self, data: CreateCategory) -> Result<Category> {
        // Category slugs stay unique even across deactivated rows
        if self.categories.values().any(|c| c.slug == data.slug) {
            return Err(AppError::Conflict(format!(
                "Category slug '{}' already exists",
                data.slug
            )));
        }

        let id = self.next_category_id.max(1);
        self.next_category_id = id + 1;

        let category = Category {
            id,
            parent_id: data.parent_id,
            name: data.name,
            slug: data.slug,
            is_active: true,
        };
        self.categories.insert(id, category.clone());
        Ok(category)
    }

    pub fn insert_product(&mut self, data: CreateProduct) -> Result<Product> {
        if self
            .products
            .values()
            .any(|p| p.is_active && p.slug == data.slug)
        {
            return Err(AppError::Conflict(format!(
                "Product slug '{}' already exists",
                data.slug
            )));
        }

        let id = self.next_product_id.max(1);
        self.next_product_id = id + 1;

        let product = Product {
            id,
            name: data.name,
            slug: data.slug,
            description: data.description,
            price: data.price,
            image_url: data.image_url,
            stock: data.stock,
            category_id: data.category_id,
            rating: crate::shared::constants::INITIAL_RATING,
            supplier_id: data.supplier_id,
            is_active: true,
        };
        self.products.insert(id, product.clone());
        Ok(product)
    }

    pub fn insert_review(&mut self, data: CreateReview) -> Review {
        let id = self.next_review_id.max(1);
        self.next_review_id = id + 1;

        let review = Review {
            id,
            user_id: data.user_id,
            product_id: data.product_id,
            comment: data.comment,
            comment_date: data.comment_date,
            grade: data.grade,
            is_active: true,
        };
        self.reviews.insert(id, review.clone());
        review
    }
}

fn next_id<T>(rows: &BTreeMap<i64, T>) -> i64 {
    rows.keys().next_back().map(|id| id + 1).unwrap_or(1)
}
