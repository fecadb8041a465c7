use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::features::reviews::models::Review;

/// Response DTO for review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponseDto {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub comment: Option<String>,
    pub comment_date: NaiveDate,
    pub grade: i32,
}

impl From<Review> for ReviewResponseDto {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            product_id: r.product_id,
            comment: r.comment,
            comment_date: r.comment_date,
            grade: r.grade,
        }
    }
}

/// Request DTO for reviewing a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewDto {
    #[validate(length(max = 2000, message = "Comment must not exceed 2000 characters"))]
    pub comment: Option<String>,

    #[validate(range(min = 1, max = 5, message = "Grade must be between 1 and 5"))]
    pub grade: i32,
}

/// Outcome of a review lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingUpdateDto {
    pub product_id: i64,
    pub rating: f64,
}
