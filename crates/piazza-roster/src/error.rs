use thiserror::Error;

/// Session registry failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("nickname already has an open session")]
    AlreadyOnline,
    #[error("no open session for this nickname")]
    NotFound,
}

/// Mailbox failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("recipient has no open session")]
    RecipientOffline,
    #[error("caller has no open session")]
    NotAuthorized,
}
