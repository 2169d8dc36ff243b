//! The two background loops every connected client runs: a fast mailbox
//! drain and a slow keepalive. Both check a shared connected flag each
//! tick and exit once it drops, mirroring how the relay side reaps the
//! session if the keepalives stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use piazza_types::models::Message;

use crate::{ClientError, RelayClient};

/// Drain interval.
pub const POLL_PERIOD: Duration = Duration::from_secs(2);
/// Default keepalive interval.
pub const KEEPALIVE_PERIOD: Duration = Duration::from_secs(30);

/// Connected flag shared between the loops and whoever owns the session.
///
/// Starts connected; anyone can pull it down. Once down it never comes
/// back up, a reconnect starts fresh loops with a fresh flag.
#[derive(Clone)]
pub struct LinkState {
    connected: Arc<AtomicBool>,
}

impl LinkState {
    pub fn new() -> Self {
        Self { connected: Arc::new(AtomicBool::new(true)) }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::Relaxed);
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

/// Drains the mailbox every two seconds and forwards messages, in arrival
/// order, to `inbox`.
///
/// A 401 means the relay no longer knows this session (swept, or closed
/// from elsewhere): the loop pulls the flag down and exits. Transport
/// errors are ignored; the next tick simply tries again.
pub async fn run_poll_loop(
    client: RelayClient,
    nickname: String,
    link: LinkState,
    inbox: mpsc::UnboundedSender<Message>,
) {
    loop {
        tokio::time::sleep(POLL_PERIOD).await;
        if !link.is_connected() {
            return;
        }
        match client.fetch_messages(&nickname).await {
            Ok(messages) => {
                for message in messages {
                    if inbox.send(message).is_err() {
                        // nobody is reading anymore
                        return;
                    }
                }
            }
            Err(ClientError::SessionExpired) => {
                warn!("session for {} is gone, stopping poll loop", nickname);
                link.mark_disconnected();
                return;
            }
            Err(ClientError::Transport(e)) => {
                debug!("poll failed, will retry: {}", e);
            }
            Err(e) => {
                debug!("poll rejected: {}", e);
            }
        }
    }
}

/// Renews the session every `period`; production callers pass
/// [`KEEPALIVE_PERIOD`], which must stay well under the relay's idle
/// threshold.
///
/// Any definitive refusal from the relay means the session is dead and
/// the loop exits after pulling the flag down. Transport hiccups are
/// tolerated indefinitely; the relay's sweeper is the real arbiter of
/// whether the silence lasted too long.
pub async fn run_keepalive_loop(
    client: RelayClient,
    nickname: String,
    link: LinkState,
    period: Duration,
) {
    loop {
        tokio::time::sleep(period).await;
        if !link.is_connected() {
            return;
        }
        match client.ping(&nickname).await {
            Ok(online) => {
                debug!("keepalive ok, {} online", online);
            }
            Err(ClientError::Transport(e)) => {
                debug!("keepalive failed, will retry: {}", e);
            }
            Err(e) => {
                warn!("keepalive rejected ({}), stopping", e);
                link.mark_disconnected();
                return;
            }
        }
    }
}
