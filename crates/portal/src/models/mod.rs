//! Canonical domain models.
//!
//! Everything the DSO returns is normalized into these shapes before it is
//! cached, stored in a session, or handed to the UI.

pub mod donation;
pub mod sponsorship;
pub mod user;

pub use donation::{Donation, DonationSource};
pub use sponsorship::{Child, Letter};
pub use user::{Address, User};
