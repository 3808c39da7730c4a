use crate::domain::UserId;

/// Core error type.
///
/// Adapter crates map their specific errors into this type so the handler can
/// treat downloader and transport failures uniformly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("download failed: {0}")]
    Download(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Per-message failure. Never fatal: the handler turns it into a reply and a
/// log entry, and the conversation stays usable.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// `None` when the message had no identifiable sender.
    #[error("sender is not on the allow-list")]
    AuthorizationDenied(Option<UserId>),

    #[error("not a Yandex Music link")]
    InvalidLink,

    #[error("unknown content type")]
    UnknownContentType,

    #[error("download failed: {0}")]
    DownloadFailure(String),
}

impl RequestError {
    /// Text shown to the user, if any. Rejected users get silence.
    pub fn user_message(&self) -> Option<String> {
        match self {
            RequestError::AuthorizationDenied(_) => None,
            RequestError::InvalidLink => {
                Some("Please send a valid Yandex Music link.".to_string())
            }
            RequestError::UnknownContentType => {
                Some("Could not determine the content type of this link.".to_string())
            }
            RequestError::DownloadFailure(msg) => Some(format!("An error occurred: {msg}")),
        }
    }
}

impl From<Error> for RequestError {
    fn from(e: Error) -> Self {
        match e {
            // Keep the downloader's own wording without the "download failed:" prefix.
            Error::Download(msg) => RequestError::DownloadFailure(msg),
            other => RequestError::DownloadFailure(other.to_string()),
        }
    }
}
