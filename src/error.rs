use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("session error: {0}")]
    Session(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not authorized: {0}")]
    Authorization(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    /// Only network and service failures are worth retrying by hand.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }

    /// Banner text for the view that attempted the action.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport(detail) => {
                format!("The ticket service could not be reached ({detail}). Please try again.")
            }
            AppError::Authorization(detail) => {
                format!("You are not allowed to do that: {detail}")
            }
            AppError::Validation(detail) => detail.clone(),
            AppError::NotFound(detail) => format!("Ticket not found: {detail}"),
            AppError::Session(detail) => format!("Please log in again: {detail}"),
            AppError::Configuration(detail) => format!("Configuration problem: {detail}"),
            AppError::Io(err) => format!("Local file error: {err}"),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
