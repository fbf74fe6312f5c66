//! HTTP endpoint handlers.
//!
//! The webhook handler is a linear verify-then-act sequence:
//! 1. Require the svix verification headers
//! 2. Verify the body signature
//! 3. Apply the event to the user store
//! 4. Return 200 with an empty body

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::event::WebhookEvent;
use crate::store::{User, UserStore};
use crate::sync::{apply_event, SyncError, SyncOutcome};
use crate::web::providers::DataClient;
use crate::web::signature::{SignatureError, Webhook, WebhookHeaders};
use crate::Config;

/// Body returned when verification headers are missing.
pub const MISSING_HEADERS_BODY: &str = "Error occurred -- no svix headers";

/// Body returned for every other failure.
pub const GENERIC_ERROR_BODY: &str = "Error occurred";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub webhook: Arc<Webhook>,
    pub store: Arc<dyn UserStore>,
}

impl AppState {
    /// Build state, decoding the webhook secret up front.
    pub fn new(config: Config, store: Arc<dyn UserStore>) -> Result<Self, SignatureError> {
        let webhook = Webhook::new(&config.webhook_secret, config.webhook_tolerance_secs)?;
        Ok(Self {
            config: Arc::new(config),
            webhook: Arc::new(webhook),
            store,
        })
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Webhook failures and the responses they map to.
///
/// Callers only ever see the fixed bodies; details go to the logs.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing svix headers")]
    MissingHeaders,

    #[error("request body is not valid UTF-8")]
    InvalidBody,

    #[error("webhook verification failed: {0}")]
    Verification(#[from] SignatureError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        match self {
            WebhookError::MissingHeaders => {
                (StatusCode::BAD_REQUEST, MISSING_HEADERS_BODY).into_response()
            }
            WebhookError::InvalidBody
            | WebhookError::Verification(_)
            | WebhookError::Sync(SyncError::InvalidPayload { .. }) => {
                (StatusCode::BAD_REQUEST, GENERIC_ERROR_BODY).into_response()
            }
            WebhookError::Sync(SyncError::Store(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_BODY).into_response()
            }
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// User Webhook
// =============================================================================

/// Auth provider user webhook endpoint.
pub async fn clerk_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let svix = WebhookHeaders::from_header_map(&headers).ok_or(WebhookError::MissingHeaders)?;

    let payload = std::str::from_utf8(&body).map_err(|e| {
        error!(svix_id = %svix.id, error = %e, "webhook_body_not_utf8");
        WebhookError::InvalidBody
    })?;

    let event: WebhookEvent = state.webhook.verify(payload, &svix).map_err(|e| {
        error!(svix_id = %svix.id, error = %e, "webhook_verification_failed");
        WebhookError::from(e)
    })?;

    info!(
        svix_id = %svix.id,
        event_type = %event.event_type,
        body_length = body.len(),
        "webhook_verified"
    );

    match apply_event(state.store.as_ref(), event).await {
        Ok(SyncOutcome::Created { user_id }) => {
            info!(svix_id = %svix.id, user_id = %user_id, "webhook_applied");
        }
        Ok(_) => {}
        Err(e) => {
            error!(svix_id = %svix.id, error = %e, "webhook_apply_failed");
            return Err(e.into());
        }
    }

    Ok((StatusCode::OK, ""))
}

// =============================================================================
// User Lookup
// =============================================================================

/// Fetch a synced user through the shared data client.
pub async fn get_user(
    Extension(client): Extension<DataClient>,
    Path(id): Path<String>,
) -> Result<Json<User>, StatusCode> {
    match client.user(&id).await {
        Ok(Some(user)) => Ok(Json(user)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(user_id = %id, error = %e, "user_lookup_failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
