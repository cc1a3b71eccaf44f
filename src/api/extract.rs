//! Request extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::AppState;
use crate::domain::value_objects::UserId;
use crate::error::AppError;
use crate::session::{Identity, Session};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts.headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Reads the identity the gateway forwards and resolves it to a [`Session`].
/// Requests without `x-user-id` are rejected with 401.
#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(uid) = header(parts, USER_ID_HEADER) else {
            warn!(path = %parts.uri.path(), "Request without identity");
            return Err(AppError::Unauthenticated);
        };
        let identity = Identity {
            uid: UserId::new(uid),
            email: header(parts, USER_EMAIL_HEADER),
            display_name: header(parts, USER_NAME_HEADER),
        };
        state.services.sessions.resolve(identity).await
    }
}
