use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    auth::{PasswordError, SessionError},
    render::RenderError,
    repository::RepositoryError,
};

/// AppError
///
/// Request-time failures that end a handler early. Validation and login failures are not
/// errors here; handlers render those as regular pages with a 400/401/422 status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("article not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        let message = match status {
            StatusCode::NOT_FOUND => "404 page not found",
            _ => "Something went wrong. Please try again later.",
        };

        (status, Html(format!("<h1>{message}</h1>"))).into_response()
    }
}
