//! Donor Portal Core - Shared domain types.
//!
//! This crate provides the types shared by the donor portal components:
//! - `portal` - The donor-facing service and its DSO integration
//! - `integration-tests` - End-to-end tests against a mock DSO backend
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, CPF documents, amounts, and status vocabularies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
