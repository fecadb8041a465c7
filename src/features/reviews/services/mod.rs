mod rating_aggregator;
mod review_service;

pub use rating_aggregator::{mean_grade, validate_grade, RatingAggregator};
pub use review_service::ReviewService;
