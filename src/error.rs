use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no user id in the current session")]
    NoUserIdentifier,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with {status}: {message}")]
    Server { status: u16, message: String },

    #[error("invalid task: {0}")]
    Validation(String),

    #[error("malformed task record: {0}")]
    MalformedRecord(String),

    #[error("no task with id {0}")]
    UnknownTask(String),

    #[error("task {0} already has a request in flight")]
    InFlight(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// True for failures that came from talking to the server.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Server { .. })
    }
}
