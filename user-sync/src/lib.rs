//! user-sync - Keeps local user records in step with the auth provider.
//!
//! ## Architecture
//!
//! ```text
//! Auth provider → svix-signed webhook → Web Server → verify → UserStore
//! ```
//!
//! Routes are wrapped by the provider shell, which scopes a [`DataClient`]
//! and an [`AuthContext`] around every handler.

pub mod config;
pub mod event;
pub mod store;
pub mod sync;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use event::{WebhookEvent, USER_CREATED};
pub use store::{InMemoryUserStore, PgUserStore, StoreError, User, UserStore};
pub use sync::{apply_event, SyncError, SyncOutcome};
pub use web::{AppState, AuthContext, DataClient};
