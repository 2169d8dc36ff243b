use chrono::Local;

use piazza_types::models::Message;

use crate::{DeliveryError, Roster};

impl Roster {
    /// Queues a message for `recipient`, stamping it with the server's
    /// local wall-clock. Delivery requires the recipient to be online
    /// right now; there is no store-and-forward for offline users.
    ///
    /// The sender is taken at face value. Senders are not required to be
    /// online or even registered.
    pub fn deposit(&self, sender: &str, recipient: &str, body: &str) -> Result<(), DeliveryError> {
        let mut state = self.state();
        let session = state
            .sessions
            .get_mut(recipient)
            .ok_or(DeliveryError::RecipientOffline)?;
        session.inbox.push(Message {
            sender: sender.to_string(),
            body: body.to_string(),
            timestamp: Local::now().format("%H:%M:%S").to_string(),
        });
        Ok(())
    }

    /// Hands back everything queued for `nickname` in arrival order and
    /// leaves the mailbox empty. Each message is observable exactly once.
    ///
    /// Draining does not refresh liveness; only opening and pinging do.
    pub fn drain(&self, nickname: &str) -> Result<Vec<Message>, DeliveryError> {
        let mut state = self.state();
        let session = state
            .sessions
            .get_mut(nickname)
            .ok_or(DeliveryError::NotAuthorized)?;
        Ok(std::mem::take(&mut session.inbox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_requires_recipient_online() {
        let roster = Roster::new();
        assert_eq!(roster.deposit("alice", "bob", "hi"), Err(DeliveryError::RecipientOffline));
    }

    #[test]
    fn drain_requires_a_session() {
        let roster = Roster::new();
        assert_eq!(roster.drain("alice"), Err(DeliveryError::NotAuthorized));
    }

    #[test]
    fn drain_preserves_arrival_order_and_empties_the_mailbox() {
        let roster = Roster::new();
        roster.open_session("bob", 6001).unwrap();
        roster.deposit("alice", "bob", "first").unwrap();
        roster.deposit("carol", "bob", "second").unwrap();
        roster.deposit("alice", "bob", "third").unwrap();

        let messages = roster.drain("bob").unwrap();
        let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second", "third"]);
        assert_eq!(messages[1].sender, "carol");

        assert!(roster.drain("bob").unwrap().is_empty());
    }

    #[test]
    fn interleaved_deposits_and_drains_lose_nothing_and_repeat_nothing() {
        let roster = Roster::new();
        roster.open_session("bob", 6001).unwrap();

        let deposited: Vec<String> = (0..12).map(|n| format!("msg-{n}")).collect();
        let mut observed = Vec::new();
        for chunk in deposited.chunks(3) {
            for body in chunk {
                roster.deposit("alice", "bob", body).unwrap();
            }
            observed.extend(roster.drain("bob").unwrap().into_iter().map(|m| m.body));
            // a second drain between deposits stays empty
            assert!(roster.drain("bob").unwrap().is_empty());
        }

        assert_eq!(observed, deposited);
    }

    #[test]
    fn undelivered_messages_die_with_the_session() {
        let roster = Roster::new();
        roster.open_session("bob", 6001).unwrap();
        roster.deposit("alice", "bob", "you will never read this").unwrap();
        roster.close_session("bob");
        roster.open_session("bob", 6001).unwrap();
        assert!(roster.drain("bob").unwrap().is_empty());
    }

    #[test]
    fn deposit_stamps_a_wall_clock_time() {
        let roster = Roster::new();
        roster.open_session("bob", 6001).unwrap();
        roster.deposit("alice", "bob", "hi").unwrap();
        let messages = roster.drain("bob").unwrap();
        let parts: Vec<&str> = messages[0].timestamp.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit())));
    }
}
