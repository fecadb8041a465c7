use chrono::NaiveDate;

use crate::features::categories::models::Category;
use crate::features::products::models::Product;
use crate::features::reviews::models::Review;
use crate::features::users::models::{Role, User};
use crate::modules::memory::{CatalogSeed, MemoryCatalogStore};
use crate::shared::constants::MISSING_IMAGE_URL;
use crate::shared::validation::slugify;

/// Owner of every fixture product
pub const SUPPLIER_ID: i64 = 2;

pub fn category(id: i64, parent_id: Option<i64>, name: &str) -> Category {
    Category {
        id,
        parent_id,
        name: name.to_string(),
        slug: slugify(name).unwrap(),
        is_active: true,
    }
}

pub fn product(id: i64, category_id: i64, name: &str) -> Product {
    Product {
        id,
        name: name.to_string(),
        slug: slugify(name).unwrap(),
        description: format!("{} description", name),
        price: 1_000,
        image_url: MISSING_IMAGE_URL.to_string(),
        stock: 5,
        category_id,
        rating: 0.0,
        supplier_id: SUPPLIER_ID,
        is_active: true,
    }
}

pub fn review(id: i64, product_id: i64, grade: i32) -> Review {
    Review {
        id,
        user_id: 100 + id,
        product_id,
        comment: Some("fixture".to_string()),
        comment_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        grade,
        is_active: true,
    }
}

pub fn user_with_roles(id: i64, roles: &[Role]) -> User {
    User {
        id,
        first_name: "Test".to_string(),
        last_name: format!("User{}", id),
        username: format!("user{}", id),
        email: format!("user{}@example.com", id),
        phone: None,
        password_hash: "$argon2id$fixture".to_string(),
        roles: roles.iter().copied().collect(),
        is_active: true,
    }
}

pub fn admin() -> User {
    user_with_roles(1, &[Role::Administrator])
}

pub fn supplier() -> User {
    user_with_roles(SUPPLIER_ID, &[Role::Supplier])
}

pub fn customer() -> User {
    user_with_roles(3, &[Role::Customer])
}

/// Catalog used across service tests:
///
/// ```text
/// 1 Electronics        13 Television
/// ├── 2 Phones         11 Nokia
/// │   └── 3 Smartphones 10 Pixel, 15 Old Pixel (no stock)
/// └── 4 Tablets        12 iPad
/// 5 Books              14 Novel
/// ```
///
/// Product 10 carries active reviews graded 4, 5 and 3.
pub fn sample_seed() -> CatalogSeed {
    let mut pixel = product(10, 3, "Pixel");
    pixel.rating = 4.0;
    let mut old_pixel = product(15, 3, "Old Pixel");
    old_pixel.stock = 0;

    CatalogSeed {
        categories: vec![
            category(1, None, "Electronics"),
            category(2, Some(1), "Phones"),
            category(3, Some(2), "Smartphones"),
            category(4, Some(1), "Tablets"),
            category(5, None, "Books"),
        ],
        products: vec![
            pixel,
            product(11, 2, "Nokia"),
            product(12, 4, "iPad"),
            product(13, 1, "Television"),
            product(14, 5, "Novel"),
            old_pixel,
        ],
        reviews: vec![review(1, 10, 4), review(2, 10, 5), review(3, 10, 3)],
    }
}

pub fn sample_store() -> MemoryCatalogStore {
    MemoryCatalogStore::from_seed(sample_seed()).unwrap()
}
