//! Type-erased request handlers.
//!
//! Handlers and middleware share one shape: an async function from [`Ctx`]
//! to a response. Middleware calls [`Ctx::next`] to continue the chain.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::http::context::Ctx;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result returned by every handler.
pub type HandlerResult = Result<Response, HandlerError>;

/// Error produced while serving a request.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An error carrying an explicit status code.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// The chain ran out of handlers.
    #[error("Cannot {method} {path}")]
    NotFound { method: String, path: String },

    /// The path matched but no route accepts the method.
    #[error("Method {method} not allowed")]
    MethodNotAllowed { method: String },

    #[error(transparent)]
    Other(#[from] BoxError),
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HandlerError::Status {
            status,
            message: message.into(),
        }
    }

    /// Status code the default error handler responds with.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Status { status, .. } => *status,
            HandlerError::NotFound { .. } => StatusCode::NOT_FOUND,
            HandlerError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            HandlerError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

type HandlerFn = dyn Fn(Ctx) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// A route handler or middleware.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Ctx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self(Arc::new(move |ctx| f(ctx).boxed()))
    }

    pub(crate) fn call(&self, ctx: Ctx) -> BoxFuture<'static, HandlerResult> {
        (self.0)(ctx)
    }

    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

/// Converts a failed chain into a response.
pub type ErrorHandler = Arc<dyn Fn(HandlerError) -> Response + Send + Sync>;

/// Default error handler: status code and message as plain text.
pub fn default_error_handler(err: HandlerError) -> Response {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(error = %err, "Handler failed");
    }
    (status, err.to_string()).into_response()
}
