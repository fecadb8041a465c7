use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::features::categories::models::default_active;

/// Stored model for product review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub comment: Option<String>,
    pub comment_date: NaiveDate,
    pub grade: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Data for creating a new review
#[derive(Debug, Clone)]
pub struct CreateReview {
    pub user_id: i64,
    pub product_id: i64,
    pub comment: Option<String>,
    pub comment_date: NaiveDate,
    pub grade: i32,
}
