use serde::{Deserialize, Serialize};

use crate::features::categories::models::default_active;
use crate::shared::constants::MISSING_IMAGE_URL;

/// Stored model for product
///
/// `rating` is a cache of the mean active review grade. It is only ever
/// written by the rating aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Price in the smallest currency unit
    pub price: u64,
    #[serde(default = "default_image_url")]
    pub image_url: String,
    pub stock: u64,
    pub category_id: i64,
    #[serde(default)]
    pub rating: f64,
    pub supplier_id: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Product {
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Data for creating a new product
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: u64,
    pub image_url: String,
    pub stock: u64,
    pub category_id: i64,
    pub supplier_id: i64,
}

fn default_image_url() -> String {
    MISSING_IMAGE_URL.to_string()
}
