use holomush_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("server address must not be empty")]
    EmptyAddress,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("rpc error: {0}")]
    Rpc(holomush_protocol::ErrorShape),
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message { message: message.into() }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

holomush_common::impl_context!();
