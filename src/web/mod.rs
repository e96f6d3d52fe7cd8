//! Web UI: template rendering, login/logout and the landing pages.
//!
//! Entity pages live in [`crate::dashboard`]; this module owns the template
//! environment they render through.

pub mod templates;

use std::sync::LazyLock;

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Form, Router};
use axum_extra::extract::cookie::SignedCookieJar;
use minijinja::{AutoEscape, Environment, context};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::redirect::is_safe_url;
use crate::auth::{User, csrf, session, users};
use crate::dashboard::entities::ENTITIES;
use crate::error::AppError;

/// Where a successful login lands when no `next` is given.
pub const DEFAULT_LANDING: &str = "/dashboard";

const USERNAME_REQUIRED: &str = "The username is required";
const PASSWORD_REQUIRED: &str = "Your password is required";
const LOGIN_FAILED: &str = "Invalid username or password.";

// ---------------------------------------------------------------------------
// Template engine
// ---------------------------------------------------------------------------

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(template_env);

/// Build a minijinja environment with all embedded templates registered.
///
/// Template names carry no extension, so HTML escaping is switched on for
/// every template explicitly.
fn template_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    for (name, source) in templates::ALL {
        if let Err(err) = env.add_template(name, source) {
            tracing::error!(template = name, error = %err, "Failed to register template");
        }
    }
    env
}

/// Render a template by name with the given minijinja context.
pub fn render(name: &str, ctx: minijinja::Value) -> Response {
    render_status(StatusCode::OK, name, ctx)
}

/// Render a template to a string.
pub fn render_to_string(name: &str, ctx: minijinja::Value) -> Result<String, minijinja::Error> {
    TEMPLATES.get_template(name)?.render(ctx)
}

/// Render a template with an explicit status code.
pub fn render_status(status: StatusCode, name: &str, ctx: minijinja::Value) -> Response {
    match render_to_string(name, ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            tracing::error!(template = name, error = %err, "Template render error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Template Error</h1>".to_string()),
            )
                .into_response()
        }
    }
}

/// One navigation entry per managed entity.
#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub singular: &'static str,
    pub href: &'static str,
    pub new_href: &'static str,
}

pub fn nav() -> Vec<NavItem> {
    ENTITIES
        .iter()
        .map(|e| NavItem {
            label: e.plural,
            singular: e.singular,
            href: e.list_path,
            new_href: e.edit_path,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public router builders
// ---------------------------------------------------------------------------

/// Routes reachable without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index_redirect))
        .route("/login", get(login_page).post(login_submit))
        .route("/health", get(health))
}

/// Routes that need a logged-in user; the caller wraps them in the session guard.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard_page))
        .route("/logout", get(logout))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index_redirect() -> Redirect {
    Redirect::temporary(DEFAULT_LANDING)
}

async fn health() -> &'static str {
    "ok"
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

#[derive(Debug, Default, Deserialize)]
struct LoginQuery {
    next: Option<String>,
}

impl LoginQuery {
    /// `next`, with a blank value treated as absent.
    fn target(&self) -> Option<&str> {
        self.next.as_deref().filter(|n| !n.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginForm {
    username: String,
    password: String,
    csrf_token: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct LoginErrors {
    username: Option<&'static str>,
    password: Option<&'static str>,
}

impl LoginErrors {
    fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

fn login_form(
    jar: SignedCookieJar,
    secure: bool,
    next: Option<&str>,
    username: &str,
    errors: &LoginErrors,
    message: Option<&str>,
) -> Response {
    let (jar, csrf_token) = csrf::ensure_token(jar, secure);
    let page = render(
        "login",
        context! {
            next => next,
            username => username,
            errors => errors,
            message => message,
            csrf_token => csrf_token,
        },
    );
    (jar, page).into_response()
}

async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: SignedCookieJar,
) -> Response {
    login_form(
        jar,
        state.config.app.secure_cookies,
        query.target(),
        "",
        &LoginErrors::default(),
        None,
    )
}

async fn login_submit(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    csrf::verify(&jar, form.csrf_token.as_deref())?;
    let secure = state.config.app.secure_cookies;
    let username = form.username.trim();

    let mut errors = LoginErrors::default();
    if username.is_empty() {
        errors.username = Some(USERNAME_REQUIRED);
    }
    if form.password.is_empty() {
        errors.password = Some(PASSWORD_REQUIRED);
    }
    if !errors.is_empty() {
        return Ok(login_form(jar, secure, query.target(), username, &errors, None));
    }

    let Some(user) = users::verify_login(&state.db, username, &form.password).await? else {
        tracing::info!(%username, "Failed login attempt");
        return Ok(login_form(
            jar,
            secure,
            query.target(),
            username,
            &errors,
            Some(LOGIN_FAILED),
        ));
    };

    let target = query.target().unwrap_or(DEFAULT_LANDING).to_string();
    if !is_safe_url(&target, &state.config.app.domains) {
        return Err(AppError::UnsafeRedirect(target));
    }

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");
    let jar = session::start(jar, &user, secure);
    Ok((jar, Redirect::to(&target)).into_response())
}

async fn logout(Extension(user): Extension<User>, jar: SignedCookieJar) -> impl IntoResponse {
    tracing::info!(user_id = user.id, username = %user.username, "User logged out");
    (session::end(jar), Redirect::to("/login"))
}

async fn dashboard_page(Extension(user): Extension<User>) -> Response {
    render("dashboard", context! { user => user, nav => nav() })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
