use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::Roster;

impl Roster {
    /// Evicts every session idle for longer than `threshold` and returns
    /// the evicted nicknames. A session's mailbox goes with it.
    pub fn sweep_idle(&self, threshold: Duration) -> Vec<String> {
        let mut state = self.state();
        let now = Instant::now();
        let idle: Vec<String> = state
            .sessions
            .iter()
            .filter(|(_, session)| now.duration_since(session.last_seen) > threshold)
            .map(|(nickname, _)| nickname.clone())
            .collect();
        for nickname in &idle {
            if let Some(session) = state.sessions.remove(nickname) {
                debug!(
                    "expiring {nickname} (advisory port {}, {} undelivered)",
                    session.port,
                    session.inbox.len()
                );
            }
        }
        idle
    }
}

/// Background task that reaps sessions whose owner stopped pinging.
///
/// Runs a sweep every `period`; anything idle past `threshold` is dropped
/// from the roster as if it had disconnected.
pub async fn run_sweep_loop(roster: Roster, period: Duration, threshold: Duration) {
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        let evicted = roster.sweep_idle(threshold);
        if !evicted.is_empty() {
            info!("swept {} idle session(s): {}", evicted.len(), evicted.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_sessions_are_evicted_and_their_nickname_freed() {
        let roster = Roster::new();
        roster.open_session("alice", 6000).unwrap();
        std::thread::sleep(Duration::from_millis(30));
        let evicted = roster.sweep_idle(Duration::from_millis(5));
        assert_eq!(evicted, vec!["alice"]);
        assert_eq!(roster.online_count(), 0);
        assert_eq!(roster.open_session("alice", 6000), Ok(1));
    }

    #[test]
    fn touched_sessions_survive_the_sweep() {
        let roster = Roster::new();
        roster.open_session("alice", 6000).unwrap();
        roster.open_session("bob", 6001).unwrap();
        std::thread::sleep(Duration::from_millis(80));
        roster.touch("alice").unwrap();
        let evicted = roster.sweep_idle(Duration::from_millis(40));
        assert_eq!(evicted, vec!["bob"]);
        assert!(roster.is_online("alice"));
        assert!(!roster.is_online("bob"));
    }

    #[test]
    fn sweep_below_threshold_is_a_no_op() {
        let roster = Roster::new();
        roster.open_session("alice", 6000).unwrap();
        assert!(roster.sweep_idle(Duration::from_secs(90)).is_empty());
        assert!(roster.is_online("alice"));
    }

    #[tokio::test]
    async fn sweep_loop_evicts_in_the_background() {
        let roster = Roster::new();
        roster.open_session("alice", 6000).unwrap();
        tokio::spawn(run_sweep_loop(
            roster.clone(),
            Duration::from_millis(10),
            Duration::from_millis(20),
        ));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(roster.online_count(), 0);
    }
}
