//! In-memory presence and delivery state.
//!
//! The roster tracks which nicknames currently have an open session and
//! holds each session's undelivered messages. Everything lives behind one
//! mutex: a session is online, has a mailbox, and is visible to the
//! sweeper as a single atomic fact. Nothing here touches disk; a restart
//! empties the roster and that is the intended behavior.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use piazza_types::models::Message;

mod error;
mod mailbox;
mod registry;
mod sweeper;

pub use error::{DeliveryError, SessionError};
pub use sweeper::run_sweep_loop;

/// Shared handle to the roster. Cheap to clone; every handler and the
/// sweeper task hold one.
#[derive(Clone)]
pub struct Roster {
    inner: Arc<Mutex<RosterState>>,
}

struct RosterState {
    sessions: HashMap<String, Session>,
}

/// Live presence for one nickname.
///
/// The inbox rides inside the session so a mailbox exists exactly as long
/// as its owner is online: closing or evicting the session drops both in
/// one move, and undelivered messages go with it.
struct Session {
    /// Advisory reconnect port reported by the client. Never dialed.
    port: u16,
    last_seen: Instant,
    inbox: Vec<Message>,
}

impl Roster {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RosterState { sessions: HashMap::new() })),
        }
    }

    fn state(&self) -> MutexGuard<'_, RosterState> {
        self.inner.lock().expect("roster lock poisoned")
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}
