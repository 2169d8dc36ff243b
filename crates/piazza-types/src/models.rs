use serde::{Deserialize, Serialize};

/// A relayed message as it sits in a mailbox and crosses the wire.
///
/// The timestamp is assigned by the server at deposit time (local
/// wall-clock, `HH:MM:SS`) — the relay never trusts sender clocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub body: String,
    pub timestamp: String,
}
