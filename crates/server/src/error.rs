use holomush_common::FromMessage;

/// Domain error taxonomy (spec §7, axis 2) — reasons an RPC call's *body*
/// reports failure, as opposed to the transport-level failures in
/// `holomush_protocol::error_codes`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication is not configured")]
    AuthUnconfigured,
    #[error("credentials rejected: {0}")]
    AuthRejected(String),
    #[error("session not found")]
    SessionNotFound,
    #[error("command must not be empty")]
    EmptyCommand,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("command {verb} failed: {cause}")]
    CommandFailed { verb: String, cause: String },
    #[error(transparent)]
    Store(#[from] holomush_store::Error),
    #[error("failed to deliver event {event_id}: {cause}")]
    SendFailed { event_id: String, cause: String },
    #[error("subscription cancelled")]
    SubscriptionCancelled,
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn command_failed(verb: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::CommandFailed {
            verb: verb.into(),
            cause: cause.to_string(),
        }
    }

    #[must_use]
    pub fn send_failed(event_id: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::SendFailed {
            event_id: event_id.into(),
            cause: cause.to_string(),
        }
    }

    /// Map this error onto the transport-level codes `holomush-protocol`
    /// reserves for conditions that can't be expressed in a response body.
    #[must_use]
    pub fn transport_code(&self) -> Option<&'static str> {
        match self {
            Self::SessionNotFound => Some(holomush_protocol::error_codes::SESSION_NOT_FOUND),
            Self::SendFailed { .. } => Some(holomush_protocol::error_codes::SEND_FAILED),
            Self::SubscriptionCancelled => Some(holomush_protocol::error_codes::CANCELLED),
            _ => None,
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

holomush_common::impl_context!();
