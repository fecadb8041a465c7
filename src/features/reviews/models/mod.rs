mod review;

pub use review::{CreateReview, Review};
