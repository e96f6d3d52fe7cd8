use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Environment override tracking
// ---------------------------------------------------------------------------

/// Tracks which configuration settings were overridden by environment variables.
///
/// Startup logs each override so an operator can tell where a value came from.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    overrides: HashMap<String, String>,
}

impl EnvOverrides {
    /// Check whether a setting key (e.g. "server.host") is overridden by an env var.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// Get the env var name that overrides the given setting key.
    pub fn env_var_for(&self, key: &str) -> Option<&str> {
        self.overrides.get(key).map(String::as_str)
    }

    /// Get all overrides as a map of setting key -> env var name.
    pub fn all(&self) -> &HashMap<String, String> {
        &self.overrides
    }

    fn record(&mut self, key: &str, env_var: &str) {
        self.overrides.insert(key.to_string(), env_var.to_string());
    }
}

// ---------------------------------------------------------------------------
// Main configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Env var overrides are not serialized to TOML.
    #[serde(skip)]
    pub env_overrides: EnvOverrides,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Dashboard behaviour: session signing, redirect allow-list and paging.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Secret used to derive the cookie signing key.
    #[serde(default)]
    pub secret_key: String,
    /// Hosts (optionally `host:port`) that a post-login `next` URL may point to.
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Mark session cookies `Secure`. Enable when served over HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            domains: Vec::new(),
            page_size: default_page_size(),
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path", alias = "uri")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Remote proxy service API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            timeout_secs: default_api_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_port() -> u16 {
    5050
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
const fn default_page_size() -> u64 {
    20
}
fn default_db_path() -> PathBuf {
    PathBuf::from("psdash.db")
}
const fn default_api_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Minimum length of `app.secret_key` in bytes.
pub const MIN_SECRET_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Config loading and env overrides
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a TOML file, then apply environment variable
    /// overrides. Any setting prefixed with `PSDASH_` takes precedence over the
    /// file value and is tracked in `env_overrides`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;
            config
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Reject settings the dashboard cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.app.secret_key.is_empty() {
            anyhow::bail!("app.secret_key is not set (PSDASH_SECRET_KEY)");
        }
        if self.app.secret_key.len() < MIN_SECRET_LEN {
            anyhow::bail!("app.secret_key must be at least {MIN_SECRET_LEN} bytes long");
        }
        if self.api.url.is_empty() {
            anyhow::bail!("api.url is not set (PSDASH_API_URL)");
        }
        url::Url::parse(&self.api.url)
            .map_err(|e| anyhow::anyhow!("api.url `{}` is not a valid URL: {e}", self.api.url))?;
        if self.app.page_size == 0 {
            anyhow::bail!("app.page_size must be greater than zero");
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Every supported setting has a corresponding `PSDASH_*` env var. When
    /// set, the env var value replaces the file/default value and the setting
    /// key is recorded in `env_overrides`.
    fn apply_env_overrides(&mut self) {
        let mut ov = EnvOverrides::default();

        macro_rules! env_str {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = val;
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_bool {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    $field = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
                    ov.record($key, $env);
                }
            };
        }
        macro_rules! env_parse {
            ($key:expr, $env:expr, $field:expr) => {
                if let Ok(val) = std::env::var($env) {
                    if let Ok(parsed) = val.parse() {
                        $field = parsed;
                        ov.record($key, $env);
                    }
                }
            };
        }

        // -- Server --
        env_str!("server.host", "PSDASH_SERVER_HOST", self.server.host);
        env_parse!("server.port", "PSDASH_SERVER_PORT", self.server.port);

        // -- App --
        env_str!("app.secret_key", "PSDASH_SECRET_KEY", self.app.secret_key);
        if let Ok(val) = std::env::var("PSDASH_APP_DOMAINS") {
            self.app.domains = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            ov.record("app.domains", "PSDASH_APP_DOMAINS");
        }
        env_parse!("app.page_size", "PSDASH_PAGE_SIZE", self.app.page_size);
        env_bool!("app.secure_cookies", "PSDASH_SECURE_COOKIES", self.app.secure_cookies);

        // -- Database --
        if let Ok(val) = std::env::var("PSDASH_DATABASE_PATH") {
            self.database.path = PathBuf::from(val);
            ov.record("database.path", "PSDASH_DATABASE_PATH");
        }

        // -- API --
        env_str!("api.url", "PSDASH_API_URL", self.api.url);
        env_str!("api.api_key", "PSDASH_API_KEY", self.api.api_key);
        env_parse!("api.timeout_secs", "PSDASH_API_TIMEOUT", self.api.timeout_secs);

        // -- Logging --
        env_str!("logging.level", "PSDASH_LOG_LEVEL", self.logging.level);
        env_bool!("logging.json", "PSDASH_LOG_JSON", self.logging.json);

        self.env_overrides = ov;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
