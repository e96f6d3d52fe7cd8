//! Double-submit CSRF tokens.
//!
//! A random token lives in a signed cookie and is embedded in every rendered
//! form as a hidden field. A POST is accepted only when both match.

use axum_extra::extract::cookie::SignedCookieJar;
use rand::Rng;
use subtle::ConstantTimeEq;

use crate::auth::session::build_cookie;
use crate::error::AppError;

pub const CSRF_COOKIE: &str = "psdash_csrf";

/// Name of the hidden form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";

const TOKEN_LEN: usize = 32;

/// Return the current token, minting and storing a new one if the browser
/// has none.
pub fn ensure_token(jar: SignedCookieJar, secure: bool) -> (SignedCookieJar, String) {
    if let Some(cookie) = jar.get(CSRF_COOKIE) {
        let token = cookie.value().to_string();
        if !token.is_empty() {
            return (jar, token);
        }
    }
    let token = generate_token();
    let jar = jar.add(build_cookie(CSRF_COOKIE, token.clone(), secure));
    (jar, token)
}

/// Check a submitted token against the cookie.
pub fn verify(jar: &SignedCookieJar, submitted: Option<&str>) -> Result<(), AppError> {
    let expected = jar.get(CSRF_COOKIE);
    match (expected, submitted) {
        (Some(cookie), Some(token))
            if !token.is_empty() && bool::from(cookie.value().as_bytes().ct_eq(token.as_bytes())) =>
        {
            Ok(())
        }
        _ => Err(AppError::BadRequest("The form has expired, reload the page and try again.".to_string())),
    }
}

fn generate_token() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}
