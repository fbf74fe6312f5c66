//! Inbound webhook event types.
//!
//! ```text
//! signed body → Webhook::verify() → WebhookEvent → sync::apply_event()
//! ```

pub mod types;

pub use types::{UserEventData, WebhookEvent, USER_CREATED};
