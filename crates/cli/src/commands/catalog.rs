//! Catalog browsing commands.

use std::fmt::Write as _;

use marketpulse_core::review::MAX_RATING;
use marketpulse_core::{Product, ProductId, Review};
use marketpulse_storefront::error::Result;
use marketpulse_storefront::reviews::RatingSummary;
use marketpulse_storefront::state::AppState;

use super::{emit, money};

/// One-line listing for a product.
pub fn render_row(product: &Product) -> String {
    let mut row = format!(
        "{:>6}  {:<32} {:>10}  {}",
        product.id,
        product.name,
        money(product.price),
        product.category
    );
    if let Some(original) = product.original_price.filter(|_| product.is_on_sale()) {
        let _ = write!(row, "  (was {})", money(original));
    }
    if !product.in_stock {
        row.push_str("  [out of stock]");
    }
    row
}

/// Reviews shown under a product.
const REVIEWS_SHOWN: usize = 5;

/// Star bar for a rating, e.g. `★★★★☆`.
fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING);
    let mut bar = "★".repeat(usize::from(filled));
    bar.push_str(&"☆".repeat(usize::from(MAX_RATING - filled)));
    bar
}

/// Customer reviews section: average, then the first few reviews.
pub fn render_reviews(reviews: &[Review], summary: &RatingSummary) -> String {
    let Some(average) = summary.average else {
        return "No customer reviews yet.".to_string();
    };

    let mut out = format!("Customer Reviews ({}), average {average:.1}", summary.count);
    for review in reviews.iter().take(REVIEWS_SHOWN) {
        let _ = write!(out, "\n  {} {}", stars(review.rating), review.title);
        let _ = write!(out, "\n    {}", review.author);
        if !review.day().is_empty() {
            let _ = write!(out, ", {}", review.day());
        }
        if !review.content.is_empty() {
            let _ = write!(out, "\n    {}", review.content);
        }
        if review.helpful > 0 {
            let _ = write!(out, "\n    {} people found this helpful", review.helpful);
        }
    }
    out
}

/// List products, optionally filtered by category and search text.
pub async fn list(state: &AppState, category: Option<&str>, search: Option<&str>) {
    let catalog = state.catalog();
    let mut products = match search {
        Some(query) => catalog.search(query).await,
        None => catalog.get_all().await,
    };
    if let Some(category) = category {
        products.retain(|p| p.category.eq_ignore_ascii_case(category.trim()));
    }

    if products.is_empty() {
        emit("No products found.");
        return;
    }
    for product in &products {
        emit(&render_row(product));
    }
}

/// Show one product in detail.
///
/// # Errors
///
/// Returns an error if the product is not in the catalog.
pub async fn show(state: &AppState, product_id: &ProductId) -> Result<()> {
    let product = state.catalog().get_by_id(product_id).await?;

    emit(&render_row(&product));
    if !product.description.is_empty() {
        emit(&product.description);
    }
    for feature in &product.features {
        emit(&format!("  - {feature}"));
    }
    if let Some(rating) = product.rating {
        emit(&format!("Rated {rating:.1} ({} reviews)", product.review_count));
    }
    let in_cart = state.cart().get_item_quantity(product_id).await;
    if in_cart > 0 {
        emit(&format!("In your cart: {in_cart}"));
    }

    let reviews = state.reviews().by_product(product_id).await;
    let summary = state.reviews().rating_summary(product_id).await;
    emit(&render_reviews(&reviews, &summary));
    Ok(())
}

#[cfg(test)]
mod tests {
    use marketpulse_core::ReviewId;
    use rust_decimal::Decimal;

    use super::*;

    fn review(id: u64, rating: u8, helpful: u32) -> Review {
        Review {
            id: ReviewId::from(id),
            product_id: ProductId::from(1),
            rating,
            title: format!("Review {id}"),
            author: "Sam".to_string(),
            date: "2024-01-15T10:30:00Z".to_string(),
            content: "Works well.".to_string(),
            helpful,
        }
    }

    #[test]
    fn test_render_row_sale_and_stock() {
        let mut product = Product::new(ProductId::from(5), "Kettle", Decimal::new(30, 0));
        product.category = "Kitchen".to_string();
        product.original_price = Some(Decimal::new(40, 0));
        product.in_stock = false;

        let row = render_row(&product);
        assert!(row.contains("Kettle"));
        assert!(row.contains("(was $40.00)"));
        assert!(row.ends_with("[out of stock]"));
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(4), "★★★★☆");
        assert_eq!(stars(9), "★★★★★");
    }

    #[test]
    fn test_render_reviews_limits_and_details() {
        let reviews: Vec<_> = (1..=7).map(|id| review(id, 4, 0)).collect();
        let summary = RatingSummary {
            count: 7,
            average: Some(4.0),
        };

        let text = render_reviews(&reviews, &summary);
        assert!(text.starts_with("Customer Reviews (7), average 4.0"));
        assert!(text.contains("Review 5"));
        assert!(!text.contains("Review 6"));
        assert!(text.contains("Sam, 2024-01-15"));
        assert!(!text.contains("helpful"));

        let helpful = render_reviews(&[review(1, 5, 3)], &summary);
        assert!(helpful.ends_with("3 people found this helpful"));
    }

    #[test]
    fn test_render_no_reviews() {
        let summary = RatingSummary {
            count: 0,
            average: None,
        };
        assert_eq!(render_reviews(&[], &summary), "No customer reviews yet.");
    }
}
