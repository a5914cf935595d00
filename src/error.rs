use std::fmt;
use thiserror::Error;

pub type MovieResult<T> = Result<T, MovieError>;

/// Failures produced by every catalog operation.
///
/// The set is closed: the presentation side maps each variant to a
/// [`UserMessage`] and never sees transport errors directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MovieError {
    /// The catalog answered with a non-2xx status.
    #[error("HTTP error {status_code}")]
    HttpError {
        status_code: u16,
        raw_body: Option<String>,
        api_message: Option<String>,
    },
    /// DNS, refused connection, timeout or a broken transfer.
    #[error("network connection problem: {details}")]
    NetworkConnectionProblem { details: String },
    /// A precondition failed before any request was sent.
    #[error("API validation problem: {details}")]
    ApiValidationProblem { details: String },
    #[error("unexpected data source error: {details}")]
    UnexpectedDataSourceError { details: String },
}

impl MovieError {
    pub fn validation(details: impl Into<String>) -> Self {
        MovieError::ApiValidationProblem {
            details: details.into(),
        }
    }

    pub fn unexpected(details: impl Into<String>) -> Self {
        MovieError::UnexpectedDataSourceError {
            details: details.into(),
        }
    }

    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            MovieError::NetworkConnectionProblem {
                details: err.to_string(),
            }
        } else {
            MovieError::unexpected(err.to_string())
        }
    }

    pub fn user_message(&self) -> UserMessage {
        match self {
            MovieError::HttpError { status_code, .. } => match status_code {
                401 | 403 => UserMessage::AccessDenied,
                404 => UserMessage::NotFound,
                400..=499 => UserMessage::BadRequest,
                500..=599 => UserMessage::ServerUnavailable,
                _ => UserMessage::ServiceUnexpected,
            },
            MovieError::NetworkConnectionProblem { .. } => UserMessage::NoConnection,
            MovieError::ApiValidationProblem { .. } => UserMessage::InvalidRequest,
            MovieError::UnexpectedDataSourceError { .. } => UserMessage::UnexpectedData,
        }
    }
}

/// Human readable failure categories shown in place of raw error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMessage {
    AccessDenied,
    NotFound,
    BadRequest,
    ServerUnavailable,
    ServiceUnexpected,
    NoConnection,
    InvalidRequest,
    UnexpectedData,
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UserMessage::AccessDenied => "Access denied. Please check your API key.",
            UserMessage::NotFound => "The requested movie could not be found.",
            UserMessage::BadRequest => "The request could not be processed.",
            UserMessage::ServerUnavailable => "The movie service is unavailable. Try again later.",
            UserMessage::ServiceUnexpected => "The movie service returned an unexpected response.",
            UserMessage::NoConnection => "No internet connection. Check your network and retry.",
            UserMessage::InvalidRequest => "Invalid request.",
            UserMessage::UnexpectedData => "Something went wrong while loading data.",
        };
        f.write_str(text)
    }
}
