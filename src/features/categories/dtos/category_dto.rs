use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::features::categories::models::Category;
use crate::features::products::dtos::ProductResponseDto;

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponseDto {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name,
            slug: c.slug,
        }
    }
}

/// Nested category with the products filed directly under it.
///
/// Leaves carry an empty `children` list rather than omitting the field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTreeDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub products: Vec<ProductResponseDto>,
    pub children: Vec<CategoryTreeDto>,
}

impl CategoryTreeDto {
    /// Number of nodes in this subtree, the node itself included
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Every product id in this subtree, pre-order
    pub fn product_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            ids.extend(node.products.iter().map(|p| p.id));
            stack.extend(node.children.iter().rev());
        }
        ids
    }
}

/// Request DTO for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 128, message = "Name must be 1-128 characters"))]
    pub name: String,

    /// Parent category; `None` creates a root
    pub parent_id: Option<i64>,
}
