//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, Key, SignedCookieJar};
use wiremock::MockServer;

use psdash::AppState;
use psdash::auth::csrf::{CSRF_COOKIE, CSRF_FIELD};
use psdash::auth::session::SESSION_COOKIE;
use psdash::auth::users;
use psdash::config::Config;
use psdash::db::Database;
use psdash::server::build_app;

pub const SECRET: &str = "integration-test-secret-key";
pub const API_KEY: &str = "k3y";
pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "correct horse battery";
pub const CSRF_TOKEN: &str = "csrftokencsrftokencsrftokencsrft";
pub const ALLOWED_DOMAIN: &str = "dash.example.com";

pub fn config(api_url: &str) -> Config {
    let mut config = Config::default();
    config.app.secret_key = SECRET.to_string();
    config.app.domains = vec![ALLOWED_DOMAIN.to_string()];
    config.api.url = api_url.to_string();
    config.api.api_key = API_KEY.to_string();
    config
}

/// State with one user (id 1) and the API pointed at `api`.
pub fn state(api: &MockServer) -> AppState {
    let db = Database::open_in_memory().unwrap();
    db.create_schema().unwrap();
    users::create_user(&db, USERNAME, PASSWORD, "Ada Admin", None).unwrap();
    AppState::new(config(&api.uri()), db).unwrap()
}

pub fn app(state: &AppState) -> Router {
    build_app(state.clone())
}

/// `Cookie` header value carrying signed `pairs`.
pub fn signed_cookies(key: &Key, pairs: &[(&'static str, &str)]) -> String {
    let mut jar = SignedCookieJar::new(key.clone());
    for (name, value) in pairs {
        jar = jar.add(Cookie::new(*name, value.to_string()));
    }
    let response = jar.into_response();
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| {
            let raw = v.to_str().unwrap();
            raw.split(';').next().unwrap().to_string()
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Cookies of a logged-in browser (session for user 1 plus a CSRF token).
pub fn logged_in(state: &AppState) -> String {
    signed_cookies(&state.cookie_key, &[(SESSION_COOKIE, "1"), (CSRF_COOKIE, CSRF_TOKEN)])
}

/// Cookies of an anonymous browser that has loaded a form.
pub fn anonymous(state: &AppState) -> String {
    signed_cookies(&state.cookie_key, &[(CSRF_COOKIE, CSRF_TOKEN)])
}

pub fn get(uri: &str, cookies: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(COOKIE, cookies)
        .body(Body::empty())
        .unwrap()
}

/// Form POST with the CSRF token appended.
pub fn post_form(uri: &str, cookies: &str, pairs: &[(&str, &str)]) -> Request<Body> {
    let mut all: Vec<(&str, &str)> = pairs.to_vec();
    all.push((CSRF_FIELD, CSRF_TOKEN));
    post_raw(uri, cookies, &all)
}

/// Form POST exactly as given.
pub fn post_raw(uri: &str, cookies: &str, pairs: &[(&str, &str)]) -> Request<Body> {
    let body = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(COOKIE, cookies)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers().get("location").unwrap().to_str().unwrap()
}

/// Names of the cookies a response sets.
pub fn set_cookie_names(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split('=').next())
        .map(str::to_string)
        .collect()
}
