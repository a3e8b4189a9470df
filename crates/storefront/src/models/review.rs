//! Product review types.

use chrono::{DateTime, Utc};

use metra_core::{ProductId, ReviewId, UserId};

/// Lowest accepted star rating.
pub const MIN_RATING: i16 = 1;
/// Highest accepted star rating.
pub const MAX_RATING: i16 = 5;

/// A review joined with its author's username.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub username: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Reasons a submitted review is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    #[error("Rating must be between {MIN_RATING} and {MAX_RATING}")]
    RatingOutOfRange,
    #[error("Please write a comment with your review")]
    EmptyComment,
}

/// Validate a rating and trim the comment.
///
/// # Errors
///
/// Returns [`ReviewError`] for an out-of-range rating or blank comment.
pub fn validate_review(rating: i16, comment: &str) -> Result<String, ReviewError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ReviewError::RatingOutOfRange);
    }
    let comment = comment.trim();
    if comment.is_empty() {
        return Err(ReviewError::EmptyComment);
    }
    Ok(comment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_review() {
        assert_eq!(validate_review(5, "  Lovely  "), Ok("Lovely".to_string()));
        assert_eq!(validate_review(0, "ok"), Err(ReviewError::RatingOutOfRange));
        assert_eq!(validate_review(6, "ok"), Err(ReviewError::RatingOutOfRange));
        assert_eq!(validate_review(3, "   "), Err(ReviewError::EmptyComment));
    }
}
