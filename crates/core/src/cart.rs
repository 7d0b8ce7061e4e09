//! Display grouping of the flat cart list.
//!
//! The cart stores one [`CatalogItem`] per unit added. Quantities only exist
//! at render time, by grouping structurally equal entries.

use serde::Serialize;

use crate::types::{CatalogItem, Price};

/// One row of the cart screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub item: CatalogItem,
    pub quantity: usize,
}

impl CartLine {
    /// Discounted unit price shown next to the struck-through list price.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        self.item.price.discounted()
    }
}

/// Group cart entries by structural equality, in first-occurrence order.
#[must_use]
pub fn group_for_display(items: &[CatalogItem]) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::new();
    for item in items {
        if let Some(line) = lines.iter_mut().find(|line| &line.item == item) {
            line.quantity += 1;
        } else {
            lines.push(CartLine {
                item: item.clone(),
                quantity: 1,
            });
        }
    }
    lines
}
