//! Checkout bill.
//!
//! Each stage truncates on its own: the discount is applied per item, then the
//! handling charge is taken from the already-truncated item total. Do not fold
//! these into a single expression over the raw prices.

use serde::Serialize;

use crate::types::{CatalogItem, Price};

/// Flat delivery fee added to every order.
pub const DELIVERY_FEE: Price = Price::new(30);

/// Handling charge as a percentage of the item total.
pub const HANDLING_PERCENT: i64 = 1;

/// Bill details shown on the cart screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub item_total: Price,
    pub handling_charge: Price,
    pub delivery_fee: Price,
    pub grand_total: Price,
}

impl Bill {
    /// Compute the bill for a flat cart list.
    #[must_use]
    pub fn from_items(items: &[CatalogItem]) -> Self {
        let item_total: Price = items.iter().map(|item| item.price.discounted()).sum();
        let handling_charge = item_total.percent(HANDLING_PERCENT);
        let delivery_fee = DELIVERY_FEE;

        Self {
            item_total,
            handling_charge,
            delivery_fee,
            grand_total: item_total + handling_charge + delivery_fee,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(price: i64) -> CatalogItem {
        CatalogItem::new("x", "c", "1", price, "u")
    }

    #[test]
    fn test_reference_cart() {
        let bill = Bill::from_items(&[item(100), item(250), item(150)]);
        assert_eq!(bill.item_total, Price::new(374));
        assert_eq!(bill.handling_charge, Price::new(3));
        assert_eq!(bill.delivery_fee, Price::new(30));
        assert_eq!(bill.grand_total, Price::new(407));
    }

    #[test]
    fn test_discount_truncates_per_item() {
        // 3 * 187.5 would be 562 if summed first; per item it is 3 * 187
        let bill = Bill::from_items(&[item(250), item(250), item(250)]);
        assert_eq!(bill.item_total, Price::new(561));
    }

    #[test]
    fn test_handling_uses_truncated_total() {
        let bill = Bill::from_items(&[item(133)]);
        assert_eq!(bill.item_total, Price::new(99));
        assert_eq!(bill.handling_charge, Price::ZERO);
        assert_eq!(bill.grand_total, Price::new(129));
    }

    #[test]
    fn test_empty_cart_still_charges_delivery() {
        let bill = Bill::from_items(&[]);
        assert_eq!(bill.item_total, Price::ZERO);
        assert_eq!(bill.grand_total, DELIVERY_FEE);
    }

    #[test]
    fn test_out_of_range_catalog_price_saturates() {
        let item: CatalogItem =
            serde_json::from_str(r#"{"item_price": 9223372036854775807}"#).unwrap();
        let bill = Bill::from_items(&[item.clone(), item]);
        assert_eq!(bill.grand_total, Price::new(i64::MAX));
    }
}
