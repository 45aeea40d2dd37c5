use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{feed::FeedError, posts::PostError, profile::FollowError},
    infra::error::InfraError,
};

/// Diagnostic trail attached to an error response as an extension.
///
/// The logging middleware reads it back, so the client only ever sees
/// the public message while the log line carries the whole cause chain.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub origin: &'static str,
    pub status: StatusCode,
    pub chain: Vec<String>,
}

impl ErrorReport {
    pub fn message(origin: &'static str, status: StatusCode, text: impl Into<String>) -> Self {
        Self {
            origin,
            status,
            chain: vec![text.into()],
        }
    }

    /// Capture an error together with every source beneath it.
    pub fn capture(origin: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut chain = vec![error.to_string()];
        let mut cause = error.source();
        while let Some(inner) = cause {
            chain.push(inner.to_string());
            cause = inner.source();
        }
        Self {
            origin,
            status,
            chain,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// An error ready to leave the HTTP boundary: a status, a short message
/// safe to show the client, and the diagnostic report for the logs.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        origin: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport::message(origin, status, detail),
        }
    }

    pub fn from_error(
        origin: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            public_message,
            report: ErrorReport::capture(origin, status, error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::UnknownGroup => HttpError::new(
                "infra::http::feed_error",
                StatusCode::NOT_FOUND,
                "Unknown group",
                "Group slug did not match any group",
            ),
            FeedError::UnknownUser => HttpError::new(
                "infra::http::feed_error",
                StatusCode::NOT_FOUND,
                "Unknown user",
                "Username did not match any user",
            ),
            FeedError::Repo(err) => HttpError::from_error(
                "infra::http::feed_error",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

impl From<PostError> for HttpError {
    fn from(error: PostError) -> Self {
        match error {
            PostError::NotFound => HttpError::new(
                "infra::http::post_error",
                StatusCode::NOT_FOUND,
                "Unknown post",
                "Post id did not match any post",
            ),
            PostError::Repo(err) => HttpError::from_error(
                "infra::http::post_error",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

impl From<FollowError> for HttpError {
    fn from(error: FollowError) -> Self {
        match error {
            FollowError::UnknownUser => HttpError::new(
                "infra::http::follow_error",
                StatusCode::NOT_FOUND,
                "Unknown user",
                "Username did not match any user",
            ),
            FollowError::Repo(err) => HttpError::from_error(
                "infra::http::follow_error",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

/// Fatal failures on the binary's startup path.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("{0}")]
    Unexpected(String),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
