use holomush_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("command argument must not be empty")]
    EmptyArgument,
    #[error("unknown verb: {0}")]
    UnknownVerb(String),
    #[error("{message}")]
    Message { message: String },
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

holomush_common::impl_context!();
