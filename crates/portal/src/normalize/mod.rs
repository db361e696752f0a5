//! Normalization of loosely-typed DSO payloads into the portal's models.
//!
//! The DSO does not agree with itself on field names (`street` vs `address`,
//! `cep` vs `zipCode`), envelopes, or even text encoding. Everything that comes
//! back from it passes through here before the rest of the portal sees it.

pub mod aliases;
pub mod dates;
pub mod donations;
pub mod fields;
pub mod mojibake;
pub mod profile;
pub mod sponsorship;

pub use aliases::FieldAliases;
pub use donations::{merge_donations, normalize_history, normalize_products};
pub use mojibake::repair;
pub use profile::{Profile, normalize_profile};
pub use sponsorship::{normalize_children, normalize_letters};
