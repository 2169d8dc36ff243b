use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use piazza_types::api::{Ack, SendMessageRequest};
use piazza_types::models::Message;

use crate::AppState;

/// Senders are not authenticated and need no session of their own; the
/// only gate is that the recipient is online right now.
pub async fn send(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let sender = req.sender.trim();
    let recipient = req.recipient.trim();
    let body = req.body.trim();
    if sender.is_empty() || recipient.is_empty() || body.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    state
        .roster
        .deposit(sender, recipient, body)
        .map_err(|_| StatusCode::NOT_FOUND)?;

    debug!("queued message from {} for {}", sender, recipient);
    Ok(Json(Ack::new("message queued")))
}

/// Read-and-clear. The owner sees each message exactly once; a second
/// drain right after the first returns an empty list.
pub async fn drain_mailbox(
    State(state): State<AppState>,
    Path(nickname): Path<String>,
) -> Result<Json<Vec<Message>>, StatusCode> {
    let messages = state
        .roster
        .drain(&nickname)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    Ok(Json(messages))
}

pub async fn list_online(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.roster.list_online())
}
