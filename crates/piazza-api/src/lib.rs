//! HTTP boundary of the relay.
//!
//! Handlers are a thin façade over the credential store and the roster:
//! they check that required fields are present, make exactly one domain
//! call, and translate its outcome to a status code. No business logic
//! lives here.

pub mod auth;
pub mod messages;
pub mod session;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use piazza_roster::Roster;
use piazza_store::CredentialStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub creds: CredentialStore,
    pub roster: Roster,
}

/// Builds the full application router. The binary mounts this on its
/// listener; integration tests mount it on an ephemeral port.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/session/open", post(session::open))
        .route("/session/close", post(session::close))
        .route("/session/ping", post(session::ping))
        .route("/messages", post(messages::send))
        .route("/mailbox/{nickname}", get(messages::drain_mailbox))
        .route("/online", get(messages::list_online))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
