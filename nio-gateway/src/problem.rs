//! Error classification and rendering for wrapped handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nio_client::NioError;
use thiserror::Error;
use tracing::error;

/// An error that carries a user-facing detail and its own HTTP status,
/// e.g. for 400, 404, 409 or 422 responses.
pub trait Problem: std::error::Error + Send + Sync + 'static {
    fn detail(&self) -> String;

    fn status(&self) -> StatusCode;
}

/// The requested resource could not be derived from the request.
#[derive(Debug, Error)]
#[error("Not Found")]
pub struct NotFound {
    detail: String,
}

impl NotFound {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl From<anyhow::Error> for NotFound {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

impl Problem for NotFound {
    fn detail(&self) -> String {
        self.detail.clone()
    }

    fn status(&self) -> StatusCode {
        StatusCode::NOT_FOUND
    }
}

/// Error returned by wrapped handlers.
///
/// Problems are shown to the client. Anything else is logged and answered
/// with a bare 500.
#[derive(Debug)]
pub enum HandlerError {
    Problem(Box<dyn Problem>),
    Opaque(anyhow::Error),
}

impl<P: Problem> From<P> for HandlerError {
    fn from(problem: P) -> Self {
        Self::Problem(Box::new(problem))
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Opaque(err)
    }
}

impl From<NioError> for HandlerError {
    fn from(err: NioError) -> Self {
        Self::Opaque(err.into())
    }
}

/// Renders `err`. For opaque errors also returns the message to log, which
/// is never sent to the client.
pub fn map_error(err: HandlerError) -> (Response, Option<String>) {
    match err {
        HandlerError::Problem(problem) => {
            let body = format!("{}: {}", problem, problem.detail());
            ((problem.status(), body).into_response(), None)
        }
        HandlerError::Opaque(err) => (
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
            Some(format!("{err:#}")),
        ),
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let (response, message) = map_error(self);
        if let Some(message) = message {
            error!(error = %message, "handler failed");
        }
        response
    }
}
