//! Product reviews and the rating they roll up into.

pub mod dtos;
pub mod models;
pub mod services;

pub use services::{RatingAggregator, ReviewService};
