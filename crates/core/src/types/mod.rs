//! Core types for Flash.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod id;
pub mod item;
pub mod otp;
pub mod phone;
pub mod price;
pub mod status;

pub use category::{CATEGORIES, Category, CategoryKey, find_category};
pub use id::*;
pub use item::CatalogItem;
pub use otp::OtpCode;
pub use phone::{COUNTRY_CODE, PhoneNumber, PhoneNumberError};
pub use price::Price;
pub use status::*;
