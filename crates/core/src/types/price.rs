//! Whole-currency price representation.
//!
//! The storefront prices everything in whole rupees. All arithmetic is integer
//! arithmetic and every division truncates, matching what the checkout screen
//! has always shown.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use serde::{Deserialize, Serialize};

/// Percentage of the list price a customer pays (flat 25% off).
pub const DISCOUNT_PERCENT: i64 = 75;

/// A price in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero rupees.
    pub const ZERO: Self = Self(0);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Get the raw amount.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// The price after the flat storefront discount, truncated.
    ///
    /// `Price::new(250).discounted()` is `187`, not `187.5` rounded.
    #[must_use]
    pub const fn discounted(self) -> Self {
        self.percent(DISCOUNT_PERCENT)
    }

    /// `percent`% of this price using truncating integer division.
    ///
    /// Hundreds and remainder are scaled separately so catalog prices near
    /// `i64::MAX` do not overflow; results beyond the range saturate.
    #[must_use]
    pub const fn percent(self, percent: i64) -> Self {
        let hundreds = self.0 / 100;
        let rest = self.0 % 100;
        Self(
            hundreds
                .saturating_mul(percent)
                .saturating_add(rest.saturating_mul(percent) / 100),
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rs. {}", self.0)
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturates at the bounds of `i64`.
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
