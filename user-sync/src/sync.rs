//! Applies verified webhook events to the user store.
//!
//! ```text
//! WebhookEvent → apply_event() → UserStore::create_user()
//! ```

use thiserror::Error;
use tracing::{info, warn};

use crate::event::{WebhookEvent, USER_CREATED};
use crate::store::{StoreError, User, UserStore};

/// What applying an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new user record was written.
    Created { user_id: String },
    /// The user already existed; nothing was written.
    AlreadyExists { user_id: String },
    /// The event type is not handled here.
    Ignored { event_type: String },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid {event_type} payload: {source}")]
    InvalidPayload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(StoreError),
}

/// Apply one verified event.
///
/// Only `user.created` causes a write; every other type is ignored.
pub async fn apply_event(
    store: &dyn UserStore,
    event: WebhookEvent,
) -> Result<SyncOutcome, SyncError> {
    if event.event_type != USER_CREATED {
        info!(event_type = %event.event_type, "webhook_event_ignored");
        return Ok(SyncOutcome::Ignored {
            event_type: event.event_type,
        });
    }

    let data = event
        .into_user_data()
        .map_err(|source| SyncError::InvalidPayload {
            event_type: USER_CREATED.to_string(),
            source,
        })?;
    let user = User::from(data);

    match store.create_user(&user).await {
        Ok(()) => {
            info!(
                user_id = %user.id,
                has_email = !user.email_address.is_empty(),
                "user_created"
            );
            Ok(SyncOutcome::Created { user_id: user.id })
        }
        Err(StoreError::AlreadyExists(user_id)) => {
            warn!(user_id = %user_id, "user_already_exists");
            Ok(SyncOutcome::AlreadyExists { user_id })
        }
        Err(e) => Err(SyncError::Store(e)),
    }
}
