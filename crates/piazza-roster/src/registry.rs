use std::time::Instant;

use crate::{Roster, Session, SessionError};

impl Roster {
    /// Opens a session for `nickname`. At most one session per nickname;
    /// a second open is rejected until the first is closed or swept.
    ///
    /// Returns the number of online users including the new session.
    pub fn open_session(&self, nickname: &str, port: u16) -> Result<usize, SessionError> {
        let mut state = self.state();
        if state.sessions.contains_key(nickname) {
            return Err(SessionError::AlreadyOnline);
        }
        state.sessions.insert(
            nickname.to_string(),
            Session { port, last_seen: Instant::now(), inbox: Vec::new() },
        );
        Ok(state.sessions.len())
    }

    /// Removes the session and whatever is left in its mailbox. Closing a
    /// nickname that is not online is a no-op, so repeated disconnects and
    /// disconnects racing the sweeper all land the same way.
    pub fn close_session(&self, nickname: &str) {
        self.state().sessions.remove(nickname);
    }

    /// Refreshes the liveness timestamp. Returns the number of online
    /// users, like [`open_session`](Self::open_session).
    pub fn touch(&self, nickname: &str) -> Result<usize, SessionError> {
        let mut state = self.state();
        let session = state.sessions.get_mut(nickname).ok_or(SessionError::NotFound)?;
        session.last_seen = Instant::now();
        Ok(state.sessions.len())
    }

    pub fn is_online(&self, nickname: &str) -> bool {
        self.state().sessions.contains_key(nickname)
    }

    pub fn online_count(&self) -> usize {
        self.state().sessions.len()
    }

    /// Online nicknames in sorted order.
    pub fn list_online(&self) -> Vec<String> {
        let state = self.state();
        let mut names: Vec<String> = state.sessions.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_open_for_same_nickname_is_rejected() {
        let roster = Roster::new();
        assert_eq!(roster.open_session("alice", 6000), Ok(1));
        assert_eq!(roster.open_session("alice", 6001), Err(SessionError::AlreadyOnline));
        assert_eq!(roster.open_session("bob", 6002), Ok(2));
    }

    #[test]
    fn close_is_idempotent_and_frees_the_nickname() {
        let roster = Roster::new();
        roster.close_session("ghost");
        roster.open_session("alice", 6000).unwrap();
        roster.close_session("alice");
        roster.close_session("alice");
        assert_eq!(roster.open_session("alice", 6000), Ok(1));
    }

    #[test]
    fn touch_requires_an_open_session() {
        let roster = Roster::new();
        assert_eq!(roster.touch("alice"), Err(SessionError::NotFound));
        roster.open_session("alice", 6000).unwrap();
        assert_eq!(roster.touch("alice"), Ok(1));
    }

    #[test]
    fn list_online_is_sorted() {
        let roster = Roster::new();
        roster.open_session("bob", 6001).unwrap();
        roster.open_session("alice", 6000).unwrap();
        assert_eq!(roster.list_online(), vec!["alice", "bob"]);
        assert_eq!(roster.online_count(), 2);
        assert!(roster.is_online("bob"));
        assert!(!roster.is_online("carol"));
    }
}
