use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, error, info};

use piazza_types::api::{Ack, CloseSessionRequest, OpenSessionRequest, PingRequest, SessionResponse};

use crate::AppState;

pub async fn open(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let nickname = req.nickname.trim();
    if nickname.is_empty() || req.port == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let registered = state.creds.is_registered(nickname).map_err(|e| {
        error!("credential store error: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if !registered {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let online_users = state
        .roster
        .open_session(nickname, req.port)
        .map_err(|_| StatusCode::CONFLICT)?;

    info!("session opened for {} ({} online)", nickname, online_users);
    Ok(Json(SessionResponse { message: "session open".into(), online_users }))
}

/// Always acks. A repeated close, a close for a nickname that was never
/// online, and a close racing the sweeper all look the same to the caller.
pub async fn close(
    State(state): State<AppState>,
    Json(req): Json<CloseSessionRequest>,
) -> Json<Ack> {
    let nickname = req.nickname.trim();
    state.roster.close_session(nickname);
    debug!("close requested for {:?}", nickname);
    Json(Ack::new("disconnected"))
}

pub async fn ping(
    State(state): State<AppState>,
    Json(req): Json<PingRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let nickname = req.nickname.trim();
    if nickname.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let online_users = state.roster.touch(nickname).map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(SessionResponse { message: "pong".into(), online_users }))
}
