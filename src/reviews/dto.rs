use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// Out-of-range ratings are rejected here, before anything touches the
/// database or the product aggregate.
pub fn check_rating(rating: i32) -> Result<(), ApiError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ApiError::validation(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(())
}

impl CreateReviewRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_rating(self.rating)?;
        if self.comment.trim().is_empty() {
            return Err(ApiError::validation("Please add a comment"));
        }
        Ok(())
    }
}

impl UpdateReviewRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(rating) = self.rating {
            check_rating(rating)?;
        }
        if let Some(comment) = &self.comment {
            if comment.trim().is_empty() {
                return Err(ApiError::validation("Please add a comment"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_within_bounds_pass() {
        for r in MIN_RATING..=MAX_RATING {
            assert!(check_rating(r).is_ok());
        }
    }

    #[test]
    fn out_of_range_ratings_are_rejected() {
        assert!(check_rating(0).is_err());
        assert!(check_rating(6).is_err());
        assert!(check_rating(-3).is_err());
    }

    #[test]
    fn create_request_requires_comment() {
        let req = CreateReviewRequest {
            product_id: Uuid::new_v4(),
            rating: 4,
            comment: "   ".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn update_request_checks_only_present_fields() {
        let req = UpdateReviewRequest {
            rating: None,
            comment: None,
        };
        assert!(req.validate().is_ok());

        let req = UpdateReviewRequest {
            rating: Some(6),
            comment: None,
        };
        assert!(req.validate().is_err());
    }
}
