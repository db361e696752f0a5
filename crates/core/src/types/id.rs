//! Newtype IDs for type-safe entity references.
//!
//! The DSO backend hands out identifiers as strings in some payloads and as
//! numbers in others, so every id is kept in its textual form. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing ids
//! from different entity types.

/// Macro to define a type-safe, string-backed ID wrapper.
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
/// # use donor_portal_core::define_id;
/// define_id!(DonorId);
/// define_id!(ChildId);
///
/// let donor = DonorId::new("123");
/// let child = ChildId::new("123");
///
/// // These are different types, so this won't compile:
/// // let _: DonorId = child;
/// assert_eq!(donor.as_str(), child.as_str());
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
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Whether the ID is empty (backend records without an id).
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(DonorId);
define_id!(ChildId);
define_id!(DonationId);
define_id!(LetterId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_serde_transparent() {
        let id = DonationId::new("history-3");
        assert_eq!(id.to_string(), "history-3");

        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"history-3\"");

        let back: DonationId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_empty_id() {
        assert!(DonorId::new("").is_empty());
        assert!(!DonorId::from("42").is_empty());
    }
}
