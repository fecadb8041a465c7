/// Image reference stored when a product is created without one
pub const MISSING_IMAGE_URL: &str = "Missing image URL";

/// Comment stored when a review is submitted without text
pub const DEFAULT_REVIEW_COMMENT: &str = "No comment";

/// Inclusive bounds for a review grade
pub const MIN_GRADE: i32 = 1;
pub const MAX_GRADE: i32 = 5;

/// Rating every product starts with, and the value the reset policy falls back to
pub const INITIAL_RATING: f64 = 0.0;
