use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info};

use piazza_types::api::{Ack, LoginRequest, RegisterRequest};

use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let nickname = req.nickname.trim().to_string();
    let password_hash = req.password_hash.trim().to_string();
    if nickname.is_empty() || password_hash.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    // Registration rewrites the snapshot file; run it off the async runtime
    let store = state.clone();
    let nick = nickname.clone();
    let created = tokio::task::spawn_blocking(move || store.creds.register(&nick, &password_hash))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("credential store error: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if !created {
        return Err(StatusCode::CONFLICT);
    }

    info!("registered nickname {}", nickname);
    Ok((StatusCode::CREATED, Json(Ack::new("registration complete"))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let nickname = req.nickname.trim();
    let password_hash = req.password_hash.trim();
    if nickname.is_empty() || password_hash.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let valid = state.creds.verify(nickname, password_hash).map_err(|e| {
        error!("credential store error: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if !valid {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Json(Ack::new("login ok")))
}
