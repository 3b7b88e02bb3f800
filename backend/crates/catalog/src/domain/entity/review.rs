//! Review Entity

use chrono::{DateTime, Utc};
use kernel::id::{ProductId, ReviewId, UserId};

#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// 1 to 5
    pub rating: i16,
    pub comment: Option<String>,
    /// Reviewer display name, filled on reads
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(
        product_id: ProductId,
        user_id: UserId,
        rating: i16,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReviewId::new(),
            product_id,
            user_id,
            rating,
            comment: comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            author_name: None,
            created_at: now,
        }
    }
}

/// Average and count kept on the product row.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i32,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[i16]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }
        let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
        let count = ratings.len() as i32;
        // One decimal place, as displayed.
        let average = ((sum as f64 / f64::from(count)) * 10.0).round() / 10.0;
        Self { average, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_summary() {
        assert_eq!(RatingSummary::from_ratings(&[]), RatingSummary::default());
        let summary = RatingSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, 4.3);
    }

    #[test]
    fn test_blank_comment_is_dropped() {
        let review = Review::new(ProductId::new(), UserId::new(), 5, Some("   ".into()), Utc::now());
        assert!(review.comment.is_none());
    }
}
