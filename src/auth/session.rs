//! Signed-cookie sessions.
//!
//! The session cookie only carries the user's session key (the numeric user
//! id). Every protected request reloads the user from storage, so deleting a
//! user ends their sessions.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};

use crate::auth::users::{self, User};
use crate::db::Database;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "psdash_session";

/// The part of a user that is stored in the session.
pub trait SessionIdentity {
    fn session_key(&self) -> String;
}

impl SessionIdentity for User {
    fn session_key(&self) -> String {
        self.id.to_string()
    }
}

/// Issue a session cookie for `identity`.
pub fn start(jar: SignedCookieJar, identity: &impl SessionIdentity, secure: bool) -> SignedCookieJar {
    jar.add(build_cookie(SESSION_COOKIE, identity.session_key(), secure))
}

/// Remove the session cookie.
pub fn end(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Resolve the session cookie to a stored user.
///
/// A missing or tampered cookie, a malformed key and a key whose user no
/// longer exists all yield `Ok(None)`.
pub fn current_user(db: &Database, jar: &SignedCookieJar) -> Result<Option<User>, AppError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    let Ok(user_id) = cookie.value().parse::<i64>() else {
        tracing::debug!("Ignoring session cookie with a malformed user id");
        return Ok(None);
    };
    match users::get_user(db, user_id) {
        Ok(user) => Ok(Some(user)),
        Err(AppError::NotFound(_)) => {
            tracing::debug!(user_id, "Session refers to a user that no longer exists");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn build_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}
