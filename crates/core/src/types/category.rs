//! The fixed set of storefront categories.

use serde::{Deserialize, Serialize};

/// A browsable category on the start screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Category {
    /// Display name; also the key items are filtered by.
    pub name: &'static str,
    /// Bundled image asset shown on the category card.
    pub image: &'static str,
}

/// Categories in the order they appear on the start screen.
pub const CATEGORIES: &[Category] = &[
    Category { name: "Fresh Fruits", image: "freshfruits" },
    Category { name: "Beverages", image: "beverages" },
    Category { name: "Sweet Tooth", image: "sweettooth" },
    Category { name: "Stationary", image: "stationary" },
    Category { name: "Pet Food", image: "petfood" },
    Category { name: "Packaged Food", image: "packagedfood" },
    Category { name: "Munchies", image: "munchies" },
    Category { name: "Kitchen Essentials", image: "kitchenessential" },
    Category { name: "Fresh Vegetables", image: "freshvegetables" },
    Category { name: "Cleaning Essentials", image: "cleaningessential" },
    Category { name: "Bread & Biscuits", image: "breadandbiscuits" },
    Category { name: "Bath & Body", image: "bathandbody" },
];

/// Look up a category by name, ignoring case.
#[must_use]
pub fn find_category(name: &str) -> Option<&'static Category> {
    let name = name.to_lowercase();
    CATEGORIES.iter().find(|c| c.name.to_lowercase() == name)
}

/// Owned category key, for places that need to store a selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryKey(String);

impl CategoryKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Category> for CategoryKey {
    fn from(category: &Category) -> Self {
        Self(category.name.to_owned())
    }
}
