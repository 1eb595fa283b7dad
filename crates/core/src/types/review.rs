//! Customer review of a product.
//!
//! Like [`Product`](super::product::Product), reviews arrive in the mock
//! field style (`Id`, `productId`, `rating`) or the hosted-backend `_c`
//! style (`rating_c`, `author_c`, `content_c`).

use serde::{Deserialize, Serialize};

use super::id::{ProductId, ReviewId};

/// Lowest star rating a review may carry.
pub const MIN_RATING: u8 = 1;

/// Highest star rating a review may carry.
pub const MAX_RATING: u8 = 5;

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(alias = "Id")]
    pub id: ReviewId,
    #[serde(alias = "productId", alias = "product_id_c")]
    pub product_id: ProductId,
    /// Stars from [`MIN_RATING`] to [`MAX_RATING`].
    #[serde(alias = "rating_c")]
    pub rating: u8,
    #[serde(default, alias = "title_c")]
    pub title: String,
    #[serde(default, alias = "author_c")]
    pub author: String,
    /// Date the review was written, as recorded (ISO 8601).
    #[serde(default, alias = "date_c")]
    pub date: String,
    #[serde(default, alias = "content_c")]
    pub content: String,
    /// How many shoppers marked the review helpful.
    #[serde(default, alias = "helpful_c")]
    pub helpful: u32,
}

impl Review {
    /// Whether the rating is within the star scale.
    #[must_use]
    pub const fn has_valid_rating(&self) -> bool {
        self.rating >= MIN_RATING && self.rating <= MAX_RATING
    }

    /// Calendar date part of `date`, for display.
    #[must_use]
    pub fn day(&self) -> &str {
        self.date.split_once('T').map_or(self.date.as_str(), |(day, _)| day)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_fields() {
        let json = r#"{
            "Id": 4,
            "productId": 2,
            "rating_c": 5,
            "title_c": "Great mug",
            "author_c": "Sam K.",
            "date_c": "2024-01-15T10:30:00Z",
            "content_c": "Keeps coffee warm.",
            "helpful_c": 3
        }"#;
        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.id, ReviewId::from(4));
        assert_eq!(review.product_id, ProductId::from(2));
        assert_eq!(review.author, "Sam K.");
        assert_eq!(review.helpful, 3);
        assert_eq!(review.day(), "2024-01-15");
        assert!(review.has_valid_rating());
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"Id": 1, "productId": "7", "rating": 0}"#;
        let review: Review = serde_json::from_str(json).unwrap();
        assert!(review.title.is_empty());
        assert_eq!(review.helpful, 0);
        assert_eq!(review.day(), "");
        assert!(!review.has_valid_rating());
    }
}
