//! Donor portal library.
//!
//! The backend a donor-facing UI talks to: it signs donors in against the DSO
//! CRM, keeps their session (with silent token renewal), and normalizes the
//! DSO's inconsistent payloads into a stable profile and donation model.
//!
//! This crate provides the portal as a library, allowing it to be tested and
//! reused; the `donor-portal` binary only adds configuration, logging and
//! error tracking.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod dso;
pub mod error;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

pub use routes::app;
pub use state::AppState;
