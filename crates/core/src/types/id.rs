//! Newtype IDs for type-safe references to opaque provider identifiers.
//!
//! Every identifier in Flash is minted by an external service (auth provider
//! user ids, realtime store push keys, verification handles), so the wrappers
//! hold strings rather than numeric keys.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use flash_core::define_id;
/// define_id!(OrderKey);
/// define_id!(ShopKey);
///
/// let order = OrderKey::new("-Nx01");
/// let shop = ShopKey::new("-Nx01");
///
/// // These are different types, so this won't compile:
/// // let _: OrderKey = shop;
/// assert_eq!(order.as_str(), shop.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Authenticated user identity (the provider's uid / localId).
define_id!(UserId);
// Push-generated key of a remote cart record.
define_id!(RecordKey);
// Handle returned by the auth provider once a code has been dispatched.
define_id!(VerificationId);
