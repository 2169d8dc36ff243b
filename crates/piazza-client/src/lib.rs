//! Client shell for the relay.
//!
//! [`RelayClient`] wraps one HTTP call per relay operation and maps status
//! codes back to typed errors. Passwords are hashed here, before they ever
//! leave the process; the relay only sees digests. The polling and
//! keepalive loops that keep a session alive live in [`polling`].

mod polling;

use std::time::Duration;

use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

use piazza_types::api::{
    CloseSessionRequest, LoginRequest, OpenSessionRequest, PingRequest, RegisterRequest,
    SendMessageRequest, SessionResponse,
};
pub use piazza_types::models::Message;

pub use polling::{LinkState, run_keepalive_loop, run_poll_loop};

/// How long the initial session open may take, per attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Budget for every ordinary call.
pub const OP_TIMEOUT: Duration = Duration::from_secs(5);
/// Budget for the parting close; past this we just leave.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(3);

const CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay unreachable after {0} attempts")]
    Unreachable(u32),
    #[error("nickname already registered")]
    NicknameTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("nickname is not registered")]
    NotRegistered,
    #[error("nickname already has an open session")]
    AlreadyOnline,
    #[error("session expired or was never opened")]
    SessionExpired,
    #[error("recipient {0} is offline")]
    RecipientOffline(String),
    #[error("relay rejected the request as malformed")]
    BadRequest,
    #[error("unexpected status {0}")]
    Unexpected(StatusCode),
}

/// SHA-256 hex digest, computed client-side so plaintext never crosses
/// the wire.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http: reqwest::Client::new(), base_url }
    }

    pub async fn register(&self, nickname: &str, password: &str) -> Result<(), ClientError> {
        let req = RegisterRequest {
            nickname: nickname.to_string(),
            password_hash: hash_password(password),
        };
        let resp = self
            .http
            .post(self.url("/auth/register"))
            .timeout(OP_TIMEOUT)
            .json(&req)
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(ClientError::NicknameTaken),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest),
            s => Err(ClientError::Unexpected(s)),
        }
    }

    pub async fn login(&self, nickname: &str, password: &str) -> Result<(), ClientError> {
        let req = LoginRequest {
            nickname: nickname.to_string(),
            password_hash: hash_password(password),
        };
        let resp = self
            .http
            .post(self.url("/auth/login"))
            .timeout(OP_TIMEOUT)
            .json(&req)
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => Err(ClientError::InvalidCredentials),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest),
            s => Err(ClientError::Unexpected(s)),
        }
    }

    /// Opens a session, retrying transport failures up to three times with
    /// a fixed backoff before giving up for good. Definitive answers from
    /// the relay (not registered, already online) are returned immediately;
    /// retrying them would only repeat the same refusal.
    ///
    /// Returns the online user count reported by the relay.
    pub async fn connect(&self, nickname: &str, port: u16) -> Result<usize, ClientError> {
        let req = OpenSessionRequest { nickname: nickname.to_string(), port };
        for attempt in 1..=CONNECT_ATTEMPTS {
            let result = self
                .http
                .post(self.url("/session/open"))
                .timeout(CONNECT_TIMEOUT)
                .json(&req)
                .send()
                .await;
            match result {
                Ok(resp) => {
                    return match resp.status() {
                        s if s.is_success() => {
                            let session: SessionResponse = resp.json().await?;
                            Ok(session.online_users)
                        }
                        StatusCode::UNAUTHORIZED => Err(ClientError::NotRegistered),
                        StatusCode::CONFLICT => Err(ClientError::AlreadyOnline),
                        StatusCode::BAD_REQUEST => Err(ClientError::BadRequest),
                        s => Err(ClientError::Unexpected(s)),
                    };
                }
                Err(e) => {
                    warn!("connect attempt {}/{} failed: {}", attempt, CONNECT_ATTEMPTS, e);
                    if attempt < CONNECT_ATTEMPTS {
                        tokio::time::sleep(CONNECT_BACKOFF).await;
                    }
                }
            }
        }
        Err(ClientError::Unreachable(CONNECT_ATTEMPTS))
    }

    /// Best-effort goodbye. The relay always acks a close and a dead relay
    /// cannot hold the session open for long anyway, so failures are
    /// swallowed.
    pub async fn disconnect(&self, nickname: &str) {
        let req = CloseSessionRequest { nickname: nickname.to_string() };
        let _ = self
            .http
            .post(self.url("/session/close"))
            .timeout(CLOSE_TIMEOUT)
            .json(&req)
            .send()
            .await;
    }

    /// Renews the session and returns the online user count.
    pub async fn ping(&self, nickname: &str) -> Result<usize, ClientError> {
        let req = PingRequest { nickname: nickname.to_string() };
        let resp = self
            .http
            .post(self.url("/session/ping"))
            .timeout(OP_TIMEOUT)
            .json(&req)
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => {
                let session: SessionResponse = resp.json().await?;
                Ok(session.online_users)
            }
            StatusCode::NOT_FOUND => Err(ClientError::SessionExpired),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest),
            s => Err(ClientError::Unexpected(s)),
        }
    }

    pub async fn send_message(
        &self,
        sender: &str,
        recipient: &str,
        body: &str,
    ) -> Result<(), ClientError> {
        let req = SendMessageRequest {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            body: body.to_string(),
        };
        let resp = self
            .http
            .post(self.url("/messages"))
            .timeout(OP_TIMEOUT)
            .json(&req)
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ClientError::RecipientOffline(recipient.to_string())),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest),
            s => Err(ClientError::Unexpected(s)),
        }
    }

    /// Drains the caller's mailbox. Messages come back in arrival order
    /// and are gone from the relay once this returns.
    pub async fn fetch_messages(&self, nickname: &str) -> Result<Vec<Message>, ClientError> {
        let resp = self
            .http
            .get(self.url(&format!("/mailbox/{}", nickname)))
            .timeout(OP_TIMEOUT)
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(resp.json().await?),
            StatusCode::UNAUTHORIZED => Err(ClientError::SessionExpired),
            s => Err(ClientError::Unexpected(s)),
        }
    }

    pub async fn list_online(&self) -> Result<Vec<String>, ClientError> {
        let resp = self.http.get(self.url("/online")).timeout(OP_TIMEOUT).send().await?;
        match resp.status() {
            s if s.is_success() => Ok(resp.json().await?),
            s => Err(ClientError::Unexpected(s)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_password_is_sha256_hex() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let client = RelayClient::new("http://127.0.0.1:5001/");
        assert_eq!(client.url("/online"), "http://127.0.0.1:5001/online");
    }
}
