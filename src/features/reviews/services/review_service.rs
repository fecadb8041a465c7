use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::store::CatalogStore;
use crate::features::reviews::dtos::{CreateReviewDto, RatingUpdateDto, ReviewResponseDto};
use crate::features::reviews::models::CreateReview;
use crate::features::reviews::services::RatingAggregator;
use crate::features::users::models::{Role, User};
use crate::shared::constants::DEFAULT_REVIEW_COMMENT;

/// Service for review operations
pub struct ReviewService<S> {
    store: Arc<S>,
    aggregator: Arc<RatingAggregator<S>>,
}

impl<S: CatalogStore> ReviewService<S> {
    pub fn new(store: Arc<S>, aggregator: Arc<RatingAggregator<S>>) -> Self {
        Self { store, aggregator }
    }

    /// Every active review
    pub async fn list(&self) -> Result<Vec<ReviewResponseDto>> {
        let reviews = self.store.list_active_reviews().await.map_err(|e| {
            tracing::error!("Failed to list reviews: {:?}", e);
            e
        })?;

        Ok(reviews.into_iter().map(|r| r.into()).collect())
    }

    /// Active reviews of one product; the product itself must be active
    pub async fn for_product(&self, product_id: i64) -> Result<Vec<ReviewResponseDto>> {
        self.store
            .find_active_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

        let reviews = self.store.get_active_reviews_for_product(product_id).await?;
        Ok(reviews.into_iter().map(|r| r.into()).collect())
    }

    /// Leave a review. Only customers may review products.
    pub async fn add(
        &self,
        actor: &User,
        product_id: i64,
        dto: CreateReviewDto,
    ) -> Result<(ReviewResponseDto, RatingUpdateDto)> {
        if let Err(e) = actor.require(Role::Customer) {
            tracing::warn!("User {} tried to review product {}: {}", actor.id, product_id, e);
            return Err(e);
        }
        dto.validate()?;

        let comment = dto
            .comment
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REVIEW_COMMENT.to_string());

        let (review, rating) = self
            .aggregator
            .on_review_created(CreateReview {
                user_id: actor.id,
                product_id,
                comment: Some(comment),
                comment_date: Utc::now().date_naive(),
                grade: dto.grade,
            })
            .await?;

        Ok((review.into(), RatingUpdateDto { product_id, rating }))
    }

    /// Deactivate a review. Administrators only.
    pub async fn remove(&self, actor: &User, review_id: i64) -> Result<RatingUpdateDto> {
        actor.require(Role::Administrator)?;

        let (product_id, rating) = self.aggregator.on_review_deactivated(review_id).await?;
        Ok(RatingUpdateDto { product_id, rating })
    }
}
