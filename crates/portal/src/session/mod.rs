//! Donor session state.
//!
//! - [`store`]: the session blob, token mirrors, expiry and local donations
//! - [`storage`]: the key/value backend trait and an in-memory backend
//! - [`web`]: the per-browser backend on top of `tower-sessions`

pub mod keys;
pub mod storage;
pub mod store;
pub mod web;

pub use storage::{MemoryStorage, SessionStorage, StorageError};
pub use store::{Credentials, Session, SessionStore};
pub use web::{WebStorage, cookie_mirror_middleware, create_session_layer};
