//! Status enums observed by the rendering layer.

use serde::{Deserialize, Serialize};

use super::item::CatalogItem;

/// State of the catalog download.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogState {
    #[default]
    Loading,
    Success(Vec<CatalogItem>),
    /// The fetch failed; the user can retry.
    Error,
}

impl CatalogState {
    /// Items, if the catalog has loaded.
    #[must_use]
    pub fn items(&self) -> Option<&[CatalogItem]> {
        match self {
            Self::Success(items) => Some(items),
            Self::Loading | Self::Error => None,
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Screens of the signed-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Start,
    Items,
    Cart,
}

impl Screen {
    /// Title shown in the top bar.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Start => "JVYumm",
            Self::Items => "Choose Items",
            Self::Cart => "Your Cart",
        }
    }
}

/// Step of the phone sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthStep {
    #[default]
    PhoneEntry,
    CodeSent,
    Verifying,
    SignedIn,
}
