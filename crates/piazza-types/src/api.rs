use serde::{Deserialize, Serialize};

// -- Auth --

// Request fields default to empty: a missing field and a blank field are
// both a 400 to the handlers, so callers get one failure mode.

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub password_hash: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub password_hash: String,
}

// -- Sessions --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub nickname: String,
    /// Advisory reconnect endpoint. Never dialed by the relay; zero is
    /// treated as absent.
    #[serde(default)]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CloseSessionRequest {
    #[serde(default)]
    pub nickname: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PingRequest {
    #[serde(default)]
    pub nickname: String,
}

// -- Messages --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub body: String,
}

// -- Responses --

#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Ack carrying the current presence headcount, returned by session
/// open and keepalive.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub message: String,
    pub online_users: usize,
}
