use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    AlreadyRegistered(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the message is meant for the caller rather than the operator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::Unauthenticated(_)
                | Error::InvalidToken(_)
                | Error::Authentication(_)
                | Error::Forbidden(_)
                | Error::NotFound(_)
                | Error::Conflict(_)
                | Error::AlreadyRegistered(_)
        )
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}
