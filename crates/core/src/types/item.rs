//! Catalog item as served by the catalog endpoint and stored in the cart.

use serde::{Deserialize, Serialize};

use super::price::Price;

/// A purchasable item.
///
/// Two items are the same item iff every field matches; there is no separate
/// identifier. The serde names are the catalog endpoint's field names and are
/// also what the remote cart store persists.
///
/// ```
/// use flash_core::CatalogItem;
///
/// let item: CatalogItem = serde_json::from_str(
///     r#"{"stringResourceId":"Banana","itemCategoryId":"Fresh Fruits",
///         "itemQuantity":"1 Kg","item_price":100,"imageResourceId":"https://img/b.png"}"#,
/// ).unwrap();
/// assert_eq!(item.price.amount(), 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogItem {
    #[serde(rename = "stringResourceId")]
    pub name: String,
    #[serde(rename = "itemCategoryId")]
    pub category: String,
    /// Pack size as shown to the user ("1 Kg", "500 g").
    #[serde(rename = "itemQuantity")]
    pub quantity: String,
    #[serde(rename = "item_price")]
    pub price: Price,
    #[serde(rename = "imageResourceId")]
    pub image_url: String,
}

impl CatalogItem {
    /// Create a new item.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: impl Into<String>,
        price: i64,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            quantity: quantity.into(),
            price: Price::new(price),
            image_url: image_url.into(),
        }
    }

    /// Whether this item belongs to `category`, ignoring case.
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.category.to_lowercase() == category.to_lowercase()
    }
}
