//! Viewer identity extraction.
//!
//! Session management proper (login forms, password flows) lives outside
//! this crate; the hosting deployment sets a session cookie carrying the
//! username and these extractors resolve it against the user store. A
//! request without a valid cookie is simply anonymous.

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
    response::Redirect,
};
use tracing::warn;

use crate::domain::entities::UserRecord;

use super::public::HttpState;

pub const SESSION_COOKIE: &str = "rostra_session";
pub const LOGIN_PATH: &str = "/auth/login";

/// The requesting user, if any. Never rejects: unknown or absent
/// sessions yield an anonymous viewer.
pub struct Viewer(pub Option<UserRecord>);

/// The requesting user, required. Anonymous viewers are redirected to
/// the authentication entry point instead of seeing an error.
pub struct RequireViewer(pub UserRecord);

impl FromRequestParts<HttpState> for Viewer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let Some(username) = session_username(parts) else {
            return Ok(Viewer(None));
        };

        match state.users.find_by_username(&username).await {
            Ok(user) => Ok(Viewer(user)),
            Err(err) => {
                warn!(
                    target: "rostra::http::session",
                    error = %err,
                    "session lookup failed; treating viewer as anonymous"
                );
                Ok(Viewer(None))
            }
        }
    }
}

impl FromRequestParts<HttpState> for RequireViewer {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        match Viewer::from_request_parts(parts, state).await {
            Ok(Viewer(Some(user))) => Ok(RequireViewer(user)),
            _ => Err(Redirect::to(LOGIN_PATH)),
        }
    }
}

fn session_username(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(COOKIE)?.to_str().ok()?;

    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}
