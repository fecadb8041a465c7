//! Catalog core for a small storefront backend.
//!
//! Two pieces carry the logic: hierarchical category aggregation
//! ([`features::categories::CategoryTreeBuilder`] over a
//! [`features::categories::CategoryIndex`]) and review rating maintenance
//! ([`features::reviews::RatingAggregator`]). Everything reaches persistence
//! through the [`core::store::CatalogStore`] boundary, so transport,
//! authentication and the real database stay outside this crate.

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;

pub use crate::core::error::{AppError, Result};
