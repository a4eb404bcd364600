pub mod roster;
pub mod tables;

use crate::errors::AppError;
use crate::export::ExportFile;
use axum::{
    extract::rejection::FormRejection,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

/// What a failed action shows when the page is drawn again.
pub(crate) enum Notice {
    /// Next to the add-person form.
    Form(String),
    /// Banner at the top of the page.
    Alert(String),
}

impl Notice {
    pub(crate) fn for_form(err: &AppError) -> Self {
        match err {
            AppError::Validation(message) => Self::Form(message.clone()),
            other => Self::Alert(other.user_message()),
        }
    }

    pub(crate) fn alert(err: &AppError) -> Self {
        Self::Alert(err.user_message())
    }

    pub(crate) fn form_error(notice: Option<&Notice>) -> Option<&str> {
        match notice {
            Some(Notice::Form(message)) => Some(message.as_str()),
            _ => None,
        }
    }

    pub(crate) fn alert_text(notice: Option<&Notice>) -> Option<&str> {
        match notice {
            Some(Notice::Alert(message)) => Some(message.as_str()),
            _ => None,
        }
    }
}

pub(crate) fn log_failure(action: &str, err: &AppError) {
    match err {
        AppError::Validation(_) => warn!(action, "rejected: {err}"),
        _ => error!(action, "failed: {err}"),
    }
}

const UNREADABLE_FORM: &str = "That request could not be read. Reload the page and try again.";

/// Error shown when a page form body does not decode.
pub(crate) fn unreadable_form(action: &str, rejection: FormRejection) -> AppError {
    warn!(action, "unreadable form: {rejection}");
    AppError::validation(UNREADABLE_FORM)
}

pub(crate) fn download(file: ExportFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}
