//! Product reviews.
//!
//! An in-memory review table loaded from a JSON file, shaped like the
//! [`Catalog`](crate::catalog::Catalog): CRUD by review ID, plus the
//! per-product listing and rating summary the product page shows.

use std::io::ErrorKind;
use std::path::Path;

use marketpulse_core::review::{MAX_RATING, MIN_RATING};
use marketpulse_core::{ProductId, Review, ReviewId};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Errors that can occur in review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// No review with this ID.
    #[error("Review not found: {0}")]
    NotFound(ReviewId),

    /// The reviews file could not be read.
    #[error("Failed to read reviews {path}: {source}")]
    Io {
        /// Reviews file path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The reviews file is not a JSON array of reviews.
    #[error("Failed to parse reviews: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two records share an ID.
    #[error("Duplicate review ID: {0}")]
    DuplicateId(ReviewId),

    /// Rating outside the star scale.
    #[error("Rating must be between 1 and 5 stars, got {0}")]
    InvalidRating(u8),

    /// The largest numeric ID is already `u64::MAX`.
    #[error("No review IDs left after {0}")]
    IdExhausted(ReviewId),
}

/// Partial update applied by [`Reviews::update`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub rating: Option<u8>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub helpful: Option<u32>,
}

impl ReviewPatch {
    fn apply(self, review: &mut Review) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(title) = self.title {
            review.title = title;
        }
        if let Some(author) = self.author {
            review.author = author;
        }
        if let Some(content) = self.content {
            review.content = content;
        }
        if let Some(helpful) = self.helpful {
            review.helpful = helpful;
        }
    }
}

/// Review count and mean rating for one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub count: u32,
    /// Mean stars, `None` when there are no reviews.
    pub average: Option<f64>,
}

const fn check_rating(rating: u8) -> Result<(), ReviewError> {
    if rating >= MIN_RATING && rating <= MAX_RATING {
        Ok(())
    } else {
        Err(ReviewError::InvalidRating(rating))
    }
}

/// In-memory review table.
#[derive(Debug, Default)]
pub struct Reviews {
    reviews: RwLock<Vec<Review>>,
}

impl Reviews {
    /// Build the table from records, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::DuplicateId` if two records share an ID and
    /// `ReviewError::InvalidRating` for a rating off the star scale.
    pub fn from_reviews(reviews: Vec<Review>) -> Result<Self, ReviewError> {
        let mut seen = std::collections::HashSet::with_capacity(reviews.len());
        for review in &reviews {
            if !seen.insert(&review.id) {
                return Err(ReviewError::DuplicateId(review.id.clone()));
            }
            check_rating(review.rating)?;
        }

        Ok(Self {
            reviews: RwLock::new(reviews),
        })
    }

    /// Parse reviews from a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Parse` for malformed JSON, plus the errors of
    /// [`Reviews::from_reviews`].
    pub fn from_json(json: &str) -> Result<Self, ReviewError> {
        let reviews: Vec<Review> = serde_json::from_str(json)?;
        Self::from_reviews(reviews)
    }

    /// Load reviews from a JSON file. A missing file is an empty table.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Io` if the file exists but cannot be read, plus
    /// the errors of [`Reviews::from_json`].
    #[instrument]
    pub async fn load(path: &Path) -> Result<Self, ReviewError> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No reviews file; starting without reviews");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ReviewError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        let reviews = Self::from_json(&json)?;
        info!(reviews = reviews.len().await, "Reviews loaded");
        Ok(reviews)
    }

    /// Number of reviews.
    pub async fn len(&self) -> usize {
        self.reviews.read().await.len()
    }

    /// Whether there are no reviews.
    pub async fn is_empty(&self) -> bool {
        self.reviews.read().await.is_empty()
    }

    /// All reviews in table order.
    pub async fn get_all(&self) -> Vec<Review> {
        self.reviews.read().await.clone()
    }

    /// Get one review.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` if no review has this ID.
    pub async fn get_by_id(&self, id: &ReviewId) -> Result<Review, ReviewError> {
        self.reviews
            .read()
            .await
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| ReviewError::NotFound(id.clone()))
    }

    /// Reviews of one product, in table order.
    pub async fn by_product(&self, product_id: &ProductId) -> Vec<Review> {
        self.reviews
            .read()
            .await
            .iter()
            .filter(|r| &r.product_id == product_id)
            .cloned()
            .collect()
    }

    /// Count and mean rating of one product's reviews.
    pub async fn rating_summary(&self, product_id: &ProductId) -> RatingSummary {
        let reviews = self.reviews.read().await;
        let (count, stars) = reviews
            .iter()
            .filter(|r| &r.product_id == product_id)
            .fold((0_u32, 0_u32), |(count, stars), r| {
                (count.saturating_add(1), stars.saturating_add(u32::from(r.rating)))
            });

        RatingSummary {
            count,
            average: (count > 0).then(|| f64::from(stars) / f64::from(count)),
        }
    }

    /// Insert a review under the next sequential ID.
    ///
    /// The ID on `review` is ignored: the new ID is one more than the
    /// largest numeric ID (or 1 for an empty table).
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating` for a rating off the star scale
    /// and `ReviewError::IdExhausted` if the largest ID is `u64::MAX`.
    #[instrument(skip(self, review), fields(product_id = %review.product_id))]
    pub async fn create(&self, mut review: Review) -> Result<Review, ReviewError> {
        check_rating(review.rating)?;
        let mut reviews = self.reviews.write().await;
        let next = match reviews.iter().filter_map(|r| r.id.as_number()).max() {
            None => 1,
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| ReviewError::IdExhausted(ReviewId::from(max)))?,
        };

        review.id = ReviewId::from(next);
        reviews.push(review.clone());
        debug!(id = %review.id, "Review created");
        Ok(review)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` if no review has this ID and
    /// `ReviewError::InvalidRating` if the patch carries a bad rating.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &ReviewId, patch: ReviewPatch) -> Result<Review, ReviewError> {
        if let Some(rating) = patch.rating {
            check_rating(rating)?;
        }
        let mut reviews = self.reviews.write().await;
        let review = reviews
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| ReviewError::NotFound(id.clone()))?;
        patch.apply(review);
        Ok(review.clone())
    }

    /// Remove a review, returning it.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::NotFound` if no review has this ID.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &ReviewId) -> Result<Review, ReviewError> {
        let mut reviews = self.reviews.write().await;
        let index = reviews
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| ReviewError::NotFound(id.clone()))?;
        Ok(reviews.remove(index))
    }
}
