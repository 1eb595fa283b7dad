//! Product record shared by the catalog and the cart.
//!
//! The record is deserialized from two historical field conventions: the
//! mock catalog (`Id`, `name`, `originalPrice`, `inStock`, ...) and the hosted
//! record service (`name_c`, `original_price_c`, `in_stock_c`, ...). Both map
//! onto the same snake_case fields here; serialization always writes the
//! canonical names.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product available in the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "Id")]
    pub id: ProductId,
    #[serde(alias = "name_c", alias = "Name")]
    pub name: String,
    #[serde(default, alias = "description_c")]
    pub description: String,
    #[serde(alias = "price_c")]
    pub price: Decimal,
    #[serde(default, alias = "originalPrice", alias = "original_price_c")]
    pub original_price: Option<Decimal>,
    /// Discount percentage advertised alongside `original_price`.
    #[serde(default, alias = "discount_c")]
    pub discount: Option<u8>,
    #[serde(default, alias = "category_c")]
    pub category: String,
    #[serde(default, alias = "subcategory_c")]
    pub subcategory: Option<String>,
    #[serde(default, alias = "images_c")]
    pub images: Vec<String>,
    #[serde(default, alias = "features_c")]
    pub features: Vec<String>,
    #[serde(default = "default_in_stock", alias = "inStock", alias = "in_stock_c")]
    pub in_stock: bool,
    #[serde(default, alias = "rating_c")]
    pub rating: Option<f32>,
    #[serde(default, alias = "reviewCount", alias = "review_count_c")]
    pub review_count: u32,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Create a minimal in-stock product with only the fields the cart needs.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            price,
            original_price: None,
            discount: None,
            category: String::new(),
            subcategory: None,
            images: Vec::new(),
            features: Vec::new(),
            in_stock: true,
            rating: None,
            review_count: 0,
        }
    }

    /// First image URL, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether the product is currently discounted below its original price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.original_price.is_some_and(|original| original > self.price)
    }
}
