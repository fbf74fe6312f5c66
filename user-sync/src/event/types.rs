//! Webhook event envelope and the payloads this service interprets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::User;

/// Event type emitted when the auth provider creates a user.
pub const USER_CREATED: &str = "user.created";

/// Verified webhook event.
///
/// Only the `type` discriminator is inspected up front; `data` stays raw
/// until a handled type asks for its typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

impl WebhookEvent {
    /// Decode `data` as a user payload.
    pub fn into_user_data(self) -> Result<UserEventData, serde_json::Error> {
        serde_json::from_value(self.data)
    }
}

/// User payload carried by `user.*` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEventData {
    pub id: String,
    /// Kept raw; only the first entry is read.
    #[serde(default)]
    pub email_addresses: Option<Vec<Value>>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl UserEventData {
    /// `email_address` of the first list entry, if it is a string.
    pub fn first_email_address(&self) -> Option<&str> {
        self.email_addresses
            .as_ref()?
            .first()?
            .get("email_address")
            .and_then(Value::as_str)
    }
}

impl From<UserEventData> for User {
    fn from(data: UserEventData) -> Self {
        let email_address = data.first_email_address().unwrap_or_default().to_string();

        User {
            id: data.id,
            email_address,
            first_name: data.first_name.unwrap_or_default(),
            last_name: data.last_name.unwrap_or_default(),
            image_url: data.image_url.unwrap_or_default(),
        }
    }
}
