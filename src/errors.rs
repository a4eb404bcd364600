use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthorized,

    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("person {0} was not found")]
    UnknownPerson(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UnknownPerson(_) => StatusCode::NOT_FOUND,
            Self::Backend(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show an operator. Backend detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => "Please sign in again.".to_string(),
            Self::InvalidCredentials => "Incorrect email or password.".to_string(),
            Self::Validation(message) => message.clone(),
            Self::UnknownPerson(_) => {
                "That person no longer exists. Reload the page and try again.".to_string()
            }
            Self::Backend(_) | Self::Config(_) => {
                "Something went wrong, please try again.".to_string()
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::backend(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::backend(err)
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::backend(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), self.user_message()).into_response()
    }
}
