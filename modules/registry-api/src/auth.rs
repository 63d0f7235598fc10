use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use registry_common::session::{verify_session, COOKIE_NAME};
use registry_store::User;

use crate::error::ApiError;
use crate::AppState;

/// Whoever is making the request. `None` for anonymous visitors, including
/// anyone whose session cookie is missing, expired or forged.
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|u| u.admin)
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(user_id) = session_user_id(&parts.headers, &state.session_secret) else {
            return Ok(Self(None));
        };

        let user = User::find_by_id(user_id, state.store.pool()).await?;
        Ok(Self(user))
    }
}

/// A signed-in administrator. Rejects with 401 when nobody is signed in and
/// 403 for everyone else.
pub struct AdminUser(pub User);

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await?.0 {
            Some(user) if user.admin => Ok(Self(user)),
            Some(_) => Err(ApiError::Forbidden),
            None => Err(ApiError::Unauthorized),
        }
    }
}

fn session_user_id(headers: &HeaderMap, secret: &str) -> Option<i64> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    let value = parse_cookie(cookie_header, COOKIE_NAME)?;
    verify_session(value, secret)
}

/// Parse a specific cookie from the Cookie header string.
fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix(name)?.strip_prefix('='))
}
