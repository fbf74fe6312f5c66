//! User storage.
//!
//! The web layer only sees the [`UserStore`] trait. Two backends exist:
//! - [`InMemoryUserStore`] for local runs and tests
//! - [`PgUserStore`] backed by a Postgres pool

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// Persisted user record, keyed by the id issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email_address: String,
    pub first_name: String,
    pub last_name: String,
    pub image_url: String,
}

/// Storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this id already exists; nothing was written.
    #[error("user {0} already exists")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Async user storage backend.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. Fails with [`StoreError::AlreadyExists`] if the id is taken.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    /// Look up a user by id.
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
}
