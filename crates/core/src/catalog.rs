//! Category filtering over the flat catalog.

use crate::types::CatalogItem;

/// Items whose category equals `key`, ignoring case, in catalog order.
///
/// The catalog is tens of items, so this is a plain linear scan.
#[must_use]
pub fn filter_by_category(items: &[CatalogItem], key: &str) -> Vec<CatalogItem> {
    let key = key.to_lowercase();
    items
        .iter()
        .filter(|item| item.category.to_lowercase() == key)
        .cloned()
        .collect()
}

/// Number of items in a category without cloning them.
#[must_use]
pub fn count_in_category(items: &[CatalogItem], key: &str) -> usize {
    items.iter().filter(|item| item.in_category(key)).count()
}
