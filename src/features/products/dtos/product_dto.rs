use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::features::products::models::Product;

/// Response DTO for product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponseDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: u64,
    pub image_url: String,
    pub stock: u64,
    pub category_id: i64,
    pub rating: f64,
    pub supplier_id: i64,
}

impl From<Product> for ProductResponseDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            slug: p.slug,
            description: p.description,
            price: p.price,
            image_url: p.image_url,
            stock: p.stock,
            category_id: p.category_id,
            rating: p.rating,
            supplier_id: p.supplier_id,
        }
    }
}

/// Request DTO for creating a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProductDto {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: String,

    /// Price in the smallest currency unit
    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price: i64,

    /// Falls back to a placeholder when absent
    pub image_url: Option<String>,

    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i64,

    pub category_id: i64,
}
