//! Review Use Cases
//!
//! Only buyers review, once per product. The product's rating summary is
//! refreshed in the same transaction as the write.

use std::sync::Arc;

use auth::CurrentUser;
use chrono::Utc;
use kernel::id::{ProductId, ReviewId};
use kernel::pagination::{Page, PageQuery};

use crate::domain::entity::Review;
use crate::domain::repository::{ProductRepository, ReviewRepository};
use crate::error::{CatalogError, CatalogResult};

pub struct CreateReviewUseCase<S>
where
    S: ProductRepository + ReviewRepository,
{
    store: Arc<S>,
}

impl<S> CreateReviewUseCase<S>
where
    S: ProductRepository + ReviewRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        user: &CurrentUser,
        product_id: &ProductId,
        rating: i16,
        comment: Option<String>,
    ) -> CatalogResult<Review> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;

        if !self.store.has_purchased(&user.id, product_id).await? {
            return Err(CatalogError::NotPurchased);
        }
        if self.store.review_exists(&user.id, product_id).await? {
            return Err(CatalogError::AlreadyReviewed);
        }

        let mut review = Review::new(*product_id, user.id, rating, comment, Utc::now());
        self.store.create_review(&review).await?;
        review.author_name = Some(user.name.clone());

        tracing::info!(review_id = %review.id, product_id = %product_id, rating, "Review posted");
        Ok(review)
    }
}

pub struct DeleteReviewUseCase<R>
where
    R: ReviewRepository,
{
    reviews: Arc<R>,
}

impl<R> DeleteReviewUseCase<R>
where
    R: ReviewRepository,
{
    pub fn new(reviews: Arc<R>) -> Self {
        Self { reviews }
    }

    pub async fn execute(&self, user: &CurrentUser, id: &ReviewId) -> CatalogResult<()> {
        let review = self
            .reviews
            .find_review(id)
            .await?
            .ok_or(CatalogError::ReviewNotFound)?;
        if !user.owns_or_admin(&review.user_id) {
            return Err(CatalogError::NotOwner);
        }
        self.reviews.delete_review(&review).await?;
        tracing::info!(review_id = %id, user_id = %user.id, "Review deleted");
        Ok(())
    }
}

pub struct ListReviewsUseCase<R>
where
    R: ReviewRepository,
{
    reviews: Arc<R>,
}

impl<R> ListReviewsUseCase<R>
where
    R: ReviewRepository,
{
    pub fn new(reviews: Arc<R>) -> Self {
        Self { reviews }
    }

    pub async fn execute(&self, product_id: &ProductId, page: PageQuery) -> CatalogResult<Page<Review>> {
        let (reviews, total) = self.reviews.list_reviews(product_id, &page).await?;
        Ok(Page::new(reviews, &page, total))
    }
}
