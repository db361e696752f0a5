//! Core types for the donor portal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod amount;
pub mod document;
pub mod id;
pub mod status;

pub use amount::{Amount, AmountError};
pub use document::{Document, DocumentError};
pub use id::*;
pub use status::*;
