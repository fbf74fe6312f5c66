//! Web server module.
//!
//! This module provides:
//! - The signed user webhook endpoint
//! - A user lookup route served through the shared data client
//! - The provider shell that scopes context around all routes

pub mod handlers;
pub mod providers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    clerk_webhook, get_user, health, AppState, HealthResponse, WebhookError,
    GENERIC_ERROR_BODY, MISSING_HEADERS_BODY,
};
pub use providers::{provider_stack, with_providers, AuthContext, DataClient};
pub use signature::{SignatureError, Webhook, WebhookHeaders};

/// Path the auth provider delivers user webhooks to.
pub const WEBHOOK_PATH: &str = "/api/clerk/webhook";

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let data_client = DataClient::new(state.store.clone());
    let auth = AuthContext::new(state.config.auth_publishable_key.clone());

    let routes = Router::new()
        .route("/health", get(health))
        .route(WEBHOOK_PATH, post(clerk_webhook))
        .route("/api/users/:id", get(get_user))
        .with_state(state);

    with_providers(routes, data_client, auth).layer(TraceLayer::new_for_http())
}
