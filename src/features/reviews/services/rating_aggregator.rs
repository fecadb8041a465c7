//! Keeps `Product::rating` equal to the rounded mean grade of the product's
//! active reviews.
//!
//! Every review write and the rating update it causes commit in one
//! transaction. Writes for the same product are additionally serialized
//! through a per-product async lock, so two concurrent reviews can never
//! compute a rating from a stale snapshot even on stores with weaker
//! isolation than the in-memory one.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::config::{CatalogConfig, EmptyRatingPolicy};
use crate::core::error::{AppError, Result};
use crate::core::store::{CatalogStore, CatalogTransaction};
use crate::features::reviews::models::{CreateReview, Review};
use crate::shared::constants::{INITIAL_RATING, MAX_GRADE, MIN_GRADE};

/// Lock table grows with every product reviewed; idle entries are pruned
/// once it passes this size
const LOCK_TABLE_PRUNE_THRESHOLD: usize = 1024;

/// Mean of `grades` rounded half-up to `precision` decimal places.
///
/// Rounding is done on the exact fraction `sum / count` in integer
/// arithmetic, so 1.875 becomes 1.88 and never 1.87 through binary
/// representation error. Returns `None` for an empty slice.
pub fn mean_grade(grades: &[i32], precision: u32) -> Option<f64> {
    if grades.is_empty() {
        return None;
    }

    let sum: i128 = grades.iter().map(|&g| i128::from(g)).sum();
    let count = grades.len() as i128;
    let scale = 10_i128.pow(precision);

    // round(sum * scale / count) for sum >= 0, ties away from zero
    let numerator = sum * scale;
    let scaled = if numerator >= 0 {
        (2 * numerator + count) / (2 * count)
    } else {
        -((-2 * numerator + count) / (2 * count))
    };

    Some(scaled as f64 / scale as f64)
}

/// Grade bounds check shared by every entry point that accepts a grade
pub fn validate_grade(grade: i32) -> Result<()> {
    if (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Grade must be between {} and {}, got {}",
            MIN_GRADE, MAX_GRADE, grade
        )))
    }
}

#[derive(Default)]
struct ProductLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ProductLocks {
    async fn for_product(&self, product_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;

        if locks.len() >= LOCK_TABLE_PRUNE_THRESHOLD && !locks.contains_key(&product_id) {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        locks.entry(product_id).or_default().clone()
    }
}

pub struct RatingAggregator<S> {
    store: Arc<S>,
    policy: EmptyRatingPolicy,
    precision: u32,
    locks: ProductLocks,
}

impl<S: CatalogStore> RatingAggregator<S> {
    pub fn new(store: Arc<S>, config: &CatalogConfig) -> Self {
        Self {
            store,
            policy: config.empty_rating_policy,
            precision: config.rating_precision,
            locks: ProductLocks::default(),
        }
    }

    pub fn policy(&self) -> EmptyRatingPolicy {
        self.policy
    }

    /// Rating the product should carry given its current active reviews.
    /// Reads only; nothing is persisted.
    pub async fn recompute(&self, product_id: i64) -> Result<f64> {
        let product = self
            .store
            .find_active_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

        let reviews = self.store.get_active_reviews_for_product(product_id).await?;
        self.rating_for(product_id, &reviews, product.rating)
    }

    /// Persist a new active review and the product rating it produces.
    pub async fn on_review_created(&self, review: CreateReview) -> Result<(Review, f64)> {
        validate_grade(review.grade)?;

        let product_id = review.product_id;
        let lock = self.locks.for_product(product_id).await;
        let _guard = lock.lock().await;

        let mut tx = self.store.begin().await?;
        match self.apply_created(&mut tx, review).await {
            Ok(outcome) => {
                tx.commit().await?;
                tracing::info!(
                    "Review {} added to product {}, rating is now {}",
                    outcome.0.id,
                    product_id,
                    outcome.1
                );
                Ok(outcome)
            }
            Err(e) => {
                Self::abort(tx, &e).await;
                Err(e)
            }
        }
    }

    /// Deactivate a review and persist the product rating without it.
    /// Returns the id of the affected product and its new rating.
    pub async fn on_review_deactivated(&self, review_id: i64) -> Result<(i64, f64)> {
        let review = self
            .store
            .find_active_review(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))?;

        let product_id = review.product_id;
        let lock = self.locks.for_product(product_id).await;
        let _guard = lock.lock().await;

        let mut tx = self.store.begin().await?;
        match self.apply_deactivated(&mut tx, review_id, product_id).await {
            Ok(rating) => {
                tx.commit().await?;
                tracing::info!(
                    "Review {} deactivated, product {} rating is now {}",
                    review_id,
                    product_id,
                    rating
                );
                Ok((product_id, rating))
            }
            Err(e) => {
                Self::abort(tx, &e).await;
                Err(e)
            }
        }
    }

    /// Recompute and persist the rating of one product, repairing any drift
    pub async fn refresh(&self, product_id: i64) -> Result<f64> {
        let lock = self.locks.for_product(product_id).await;
        let _guard = lock.lock().await;

        let mut tx = self.store.begin().await?;
        match self.apply_refresh(&mut tx, product_id).await {
            Ok(rating) => {
                tx.commit().await?;
                Ok(rating)
            }
            Err(e) => {
                Self::abort(tx, &e).await;
                Err(e)
            }
        }
    }

    /// Refresh every active product, in stock or not. Products whose refresh
    /// fails are logged and skipped; returns how many were refreshed.
    pub async fn refresh_all(&self) -> Result<usize> {
        let products = self.store.list_active_products().await?;
        let mut refreshed = 0;

        for product in products {
            match self.refresh(product.id).await {
                Ok(_) => refreshed += 1,
                Err(e) => {
                    tracing::warn!("Could not refresh rating of product {}: {}", product.id, e)
                }
            }
        }

        Ok(refreshed)
    }

    async fn apply_created(&self, tx: &mut S::Tx, review: CreateReview) -> Result<(Review, f64)> {
        let product_id = review.product_id;
        let product = tx.find_active_product(product_id).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "No product with product_id={} found to leave a review",
                product_id
            ))
        })?;

        let created = tx.insert_review(review).await?;
        let rating = self.recompute_in(tx, product_id, product.rating).await?;
        tx.update_product_rating(product_id, rating).await?;

        Ok((created, rating))
    }

    async fn apply_deactivated(
        &self,
        tx: &mut S::Tx,
        review_id: i64,
        product_id: i64,
    ) -> Result<f64> {
        // Re-read under the lock: a concurrent call may have won the race
        tx.find_active_review(review_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", review_id)))?;
        tx.deactivate_review(review_id).await?;

        let product = tx.find_product(product_id).await?.ok_or_else(|| {
            AppError::Consistency(format!(
                "Review {} points at unknown product {}",
                review_id, product_id
            ))
        })?;

        if !product.is_active {
            // Ratings of deactivated products are no longer maintained
            tracing::debug!(
                "Product {} is inactive, skipping rating update for review {}",
                product_id,
                review_id
            );
            return Ok(product.rating);
        }

        let rating = self.recompute_in(tx, product_id, product.rating).await?;
        tx.update_product_rating(product_id, rating).await?;

        Ok(rating)
    }

    async fn apply_refresh(&self, tx: &mut S::Tx, product_id: i64) -> Result<f64> {
        let product = tx
            .find_active_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

        let rating = self.recompute_in(tx, product_id, product.rating).await?;
        tx.update_product_rating(product_id, rating).await?;

        Ok(rating)
    }

    async fn recompute_in(&self, tx: &mut S::Tx, product_id: i64, current: f64) -> Result<f64> {
        let reviews = tx.get_active_reviews_for_product(product_id).await?;
        self.rating_for(product_id, &reviews, current)
    }

    fn rating_for(&self, product_id: i64, reviews: &[Review], current: f64) -> Result<f64> {
        let grades: Vec<i32> = reviews.iter().map(|r| r.grade).collect();
        if let Some(rating) = mean_grade(&grades, self.precision) {
            return Ok(rating);
        }

        match self.policy {
            EmptyRatingPolicy::Reset => Ok(INITIAL_RATING),
            EmptyRatingPolicy::Keep => Ok(current),
            EmptyRatingPolicy::Reject => {
                tracing::warn!("Product {} has no active reviews left to rate", product_id);
                Err(AppError::Consistency(format!(
                    "Product {} has no active reviews to compute a rating from",
                    product_id
                )))
            }
        }
    }

    async fn abort(tx: S::Tx, cause: &AppError) {
        tracing::warn!("Rolling back rating update: {}", cause);
        if let Err(e) = tx.rollback().await {
            tracing::error!("Failed to roll back rating update: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fake::Fake;

    use crate::modules::memory::{CatalogSeed, MemoryCatalogStore};
    use crate::shared::test_helpers::{category, product, review, sample_store};

    fn config(policy: EmptyRatingPolicy) -> CatalogConfig {
        CatalogConfig {
            empty_rating_policy: policy,
            ..Default::default()
        }
    }

    fn new_review(product_id: i64, grade: i32) -> CreateReview {
        CreateReview {
            user_id: 3,
            product_id,
            comment: None,
            comment_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            grade,
        }
    }

    /// Product 1 with two reviews graded 5
    fn two_fives() -> Arc<MemoryCatalogStore> {
        Arc::new(
            MemoryCatalogStore::from_seed(CatalogSeed {
                categories: vec![category(1, None, "Phones")],
                products: vec![product(1, 1, "Pixel")],
                reviews: vec![review(1, 1, 5), review(2, 1, 5)],
            })
            .unwrap(),
        )
    }

    async fn stored_rating(store: &MemoryCatalogStore, product_id: i64) -> f64 {
        store
            .find_active_product(product_id)
            .await
            .unwrap()
            .unwrap()
            .rating
    }

    #[test]
    fn test_mean_grade() {
        assert_eq!(mean_grade(&[4, 5, 3], 2), Some(4.0));
        assert_eq!(mean_grade(&[4, 4, 5], 2), Some(4.33));
        assert_eq!(mean_grade(&[4, 5, 5], 2), Some(4.67));
        assert_eq!(mean_grade(&[1, 2], 0), Some(2.0));
        assert_eq!(mean_grade(&[], 2), None);
    }

    #[test]
    fn test_mean_grade_rounds_exact_ties_up() {
        // 15 / 8 = 1.875 exactly
        assert_eq!(mean_grade(&[1, 2, 2, 2, 2, 2, 2, 2], 2), Some(1.88));
        // 5 / 8 = 0.625 exactly
        assert_eq!(mean_grade(&[0, 0, 0, 1, 1, 1, 1, 1], 2), Some(0.63));
    }

    #[test]
    fn test_validate_grade_bounds() {
        assert!(validate_grade(1).is_ok());
        assert!(validate_grade(5).is_ok());
        assert!(matches!(validate_grade(0), Err(AppError::Validation(_))));
        assert!(matches!(validate_grade(6), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_recompute_mean_of_active_reviews() {
        let aggregator = RatingAggregator::new(Arc::new(sample_store()), &CatalogConfig::default());
        assert_eq!(aggregator.recompute(10).await.unwrap(), 4.0);
    }

    #[tokio::test]
    async fn test_recompute_unknown_product() {
        let aggregator = RatingAggregator::new(Arc::new(sample_store()), &CatalogConfig::default());
        assert!(matches!(
            aggregator.recompute(404).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deactivation_uses_remaining_reviews_only() {
        let store = two_fives();
        let aggregator = RatingAggregator::new(store.clone(), &CatalogConfig::default());

        let (product_id, rating) = aggregator.on_review_deactivated(1).await.unwrap();
        assert_eq!(product_id, 1);
        assert_eq!(rating, 5.0);
        assert_eq!(aggregator.recompute(1).await.unwrap(), 5.0);
        assert_eq!(stored_rating(&store, 1).await, 5.0);
    }

    #[tokio::test]
    async fn test_created_review_updates_rating() {
        let store = Arc::new(sample_store());
        let aggregator = RatingAggregator::new(store.clone(), &CatalogConfig::default());

        let (created, rating) = aggregator.on_review_created(new_review(10, 2)).await.unwrap();
        assert!(created.is_active);
        assert_eq!(created.product_id, 10);
        // (4 + 5 + 3 + 2) / 4
        assert_eq!(rating, 3.5);
        assert_eq!(stored_rating(&store, 10).await, 3.5);
    }

    #[tokio::test]
    async fn test_out_of_range_grade_changes_nothing() {
        let store = Arc::new(sample_store());
        let aggregator = RatingAggregator::new(store.clone(), &CatalogConfig::default());

        for grade in [0, 6] {
            let err = aggregator.on_review_created(new_review(10, grade)).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        assert_eq!(store.get_active_reviews_for_product(10).await.unwrap().len(), 3);
        assert_eq!(stored_rating(&store, 10).await, 4.0);
    }

    #[tokio::test]
    async fn test_review_for_missing_product() {
        let store = Arc::new(sample_store());
        let aggregator = RatingAggregator::new(store.clone(), &CatalogConfig::default());

        let err = aggregator.on_review_created(new_review(404, 4)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.list_active_reviews().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_last_review_reset_policy() {
        let store = two_fives();
        let aggregator = RatingAggregator::new(store.clone(), &config(EmptyRatingPolicy::Reset));

        aggregator.on_review_deactivated(1).await.unwrap();
        let (_, rating) = aggregator.on_review_deactivated(2).await.unwrap();

        assert_eq!(rating, 0.0);
        assert_eq!(stored_rating(&store, 1).await, 0.0);
    }

    #[tokio::test]
    async fn test_last_review_keep_policy() {
        let store = two_fives();
        let aggregator = RatingAggregator::new(store.clone(), &config(EmptyRatingPolicy::Keep));

        aggregator.on_review_deactivated(1).await.unwrap();
        let (_, rating) = aggregator.on_review_deactivated(2).await.unwrap();

        assert_eq!(rating, 5.0);
        assert_eq!(stored_rating(&store, 1).await, 5.0);
        assert!(store.get_active_reviews_for_product(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_last_review_reject_policy_rolls_back() {
        let store = two_fives();
        let aggregator = RatingAggregator::new(store.clone(), &config(EmptyRatingPolicy::Reject));

        aggregator.on_review_deactivated(1).await.unwrap();
        let err = aggregator.on_review_deactivated(2).await.unwrap_err();

        assert!(matches!(err, AppError::Consistency(_)));
        assert!(store.find_active_review(2).await.unwrap().is_some());
        assert_eq!(stored_rating(&store, 1).await, 5.0);
    }

    #[tokio::test]
    async fn test_failed_rating_update_rolls_back_insert() {
        let store = Arc::new(sample_store());
        let aggregator = RatingAggregator::new(store.clone(), &CatalogConfig::default());
        store.fail_rating_updates(true).await;

        let err = aggregator.on_review_created(new_review(10, 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(store.get_active_reviews_for_product(10).await.unwrap().len(), 3);

        let err = aggregator.on_review_deactivated(1).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
        assert!(store.review_by_id(1).await.unwrap().is_active);
        assert_eq!(stored_rating(&store, 10).await, 4.0);
    }

    #[tokio::test]
    async fn test_deactivating_twice_is_not_found() {
        let store = Arc::new(sample_store());
        let aggregator = RatingAggregator::new(store.clone(), &CatalogConfig::default());

        aggregator.on_review_deactivated(3).await.unwrap();
        assert!(matches!(
            aggregator.on_review_deactivated(3).await,
            Err(AppError::NotFound(_))
        ));
        // (4 + 5) / 2
        assert_eq!(stored_rating(&store, 10).await, 4.5);
    }

    #[tokio::test]
    async fn test_refresh_repairs_drifted_rating() {
        let mut seed = crate::shared::test_helpers::sample_seed();
        seed.products[0].rating = 1.0;
        let store = Arc::new(MemoryCatalogStore::from_seed(seed).unwrap());
        let aggregator = RatingAggregator::new(store.clone(), &CatalogConfig::default());

        assert_eq!(aggregator.refresh(10).await.unwrap(), 4.0);
        assert_eq!(stored_rating(&store, 10).await, 4.0);
    }

    #[tokio::test]
    async fn test_refresh_all_covers_out_of_stock_products() {
        let mut seed = crate::shared::test_helpers::sample_seed();
        seed.reviews.push(review(4, 15, 2));
        let old_pixel = seed.products.iter_mut().find(|p| p.id == 15).unwrap();
        old_pixel.rating = 4.9;
        let store = Arc::new(MemoryCatalogStore::from_seed(seed).unwrap());
        let aggregator = RatingAggregator::new(store.clone(), &CatalogConfig::default());

        assert_eq!(aggregator.refresh_all().await.unwrap(), 6);
        assert_eq!(stored_rating(&store, 15).await, 2.0);
        assert_eq!(stored_rating(&store, 10).await, 4.0);
    }

    #[tokio::test]
    async fn test_deactivation_on_inactive_product_reports_stored_rating() {
        let store = two_fives();
        let aggregator = RatingAggregator::new(store.clone(), &CatalogConfig::default());
        aggregator.refresh(1).await.unwrap();
        store.deactivate_product(1).await.unwrap();

        let (product_id, rating) = aggregator.on_review_deactivated(1).await.unwrap();
        assert_eq!(product_id, 1);
        assert_eq!(rating, 5.0);
        assert!(store.find_active_review(1).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reviews_produce_consistent_rating() {
        let store = two_fives();
        let aggregator = Arc::new(RatingAggregator::new(store.clone(), &CatalogConfig::default()));

        let grades: Vec<i32> = (0..32).map(|_| (1..6).fake::<i32>()).collect();
        let mut handles = Vec::new();
        for &grade in &grades {
            let aggregator = aggregator.clone();
            handles.push(tokio::spawn(async move {
                aggregator.on_review_created(new_review(1, grade)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut all = grades.clone();
        all.extend([5, 5]);
        assert_eq!(stored_rating(&store, 1).await, mean_grade(&all, 2).unwrap());
    }
}
