use holomush_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Rcgen(#[from] rcgen::Error),
    #[error(transparent)]
    Rustls(#[from] rustls::Error),
    #[error(transparent)]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),
    #[error("malformed certificate or key: {0}")]
    Format(String),

    #[error("certificate expired {days_since} day(s) ago")]
    CertExpired { days_since: i64 },
    #[error("certificate is not yet valid; becomes valid in {days_until} day(s)")]
    CertNotYetValid { days_until: i64 },
    #[error("certificate expires in {days} day(s) (deadline {deadline})")]
    CertNearExpiry { days: i64, deadline: String },
    #[error("certificate chain is not signed by the expected CA")]
    ChainInvalid,
    #[error("certificate does not match hostname {host:?}")]
    HostnameMismatch { host: String },
    #[error("certificate is missing required extended key usage {required:?}")]
    KeyUsageMismatch { required: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

holomush_common::impl_context!();
