use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error returned across the command boundary to the frontend.
#[derive(Debug, Serialize)]
pub struct AppError {
    pub message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError {
            message: err.to_string(),
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError { message: msg }
    }
}

/// Terminal outcome of a failed classification attempt.
///
/// The `Display` text is what the user sees.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifyError {
    /// Non-2xx status or an empty body.
    #[error("Server response error")]
    ServerResponse,

    /// DNS, connect, timeout or body read failure.
    #[error("Request exception: {0}")]
    Request(String),

    /// The body was not a valid classification result.
    #[error("Error processing response: {0}")]
    Malformed(String),

    /// The image could not be turned into JPEG bytes.
    #[error("Error processing image: {0}")]
    Encoding(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("A classification is already in progress")]
    AlreadyLoading,

    #[error("No image selected")]
    NoImage,
}
