pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod forms;
pub mod net;
pub mod pagination;
pub mod server;
pub mod web;

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::config::Config;
use crate::db::Database;
use crate::net::{HttpClient, RestClient};

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub api: RestClient,
    pub cookie_key: Key,
}

impl AppState {
    /// Build the state from a validated configuration and an open database.
    pub fn new(config: Config, db: Database) -> anyhow::Result<Self> {
        let http = HttpClient::with_timeout(config.api.timeout())?;
        let api = RestClient::new(&config.api.url, config.api.api_key.clone(), http)?;
        let cookie_key = cookie_key(&config.app.secret_key);
        Ok(Self {
            config: Arc::new(config),
            db,
            api,
            cookie_key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the 64-byte cookie signing key from the configured secret.
pub fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}
