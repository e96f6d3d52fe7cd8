use axum::extract::{Request, State};
use axum::http::Uri;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::auth::session;
use crate::error::AppError;
use crate::AppState;

/// Axum middleware that resolves the session cookie to a stored user and
/// injects the `User` into request extensions.
///
/// Anonymous requests are redirected to the login page with the original path
/// and query carried in `next`.
pub async fn require_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match session::current_user(&state.db, &jar)? {
        Some(user) => {
            tracing::debug!(user_id = user.id, username = %user.username, "Authenticated request");
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        None => Ok(login_redirect(request.uri()).into_response()),
    }
}

/// `303 See Other` to `/login?next=<path and query>`.
pub fn login_redirect(uri: &Uri) -> Redirect {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    Redirect::to(&format!("/login?next={}", urlencoding::encode(target)))
}
