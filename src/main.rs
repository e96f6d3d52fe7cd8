//! psdash -- dashboard for the proxy service API.
//!
//! This is the application entry point. It wires together:
//!   - Configuration loading and validation
//!   - Database initialization and user administration commands
//!   - The HTTP server (login, dashboard and entity pages)
//!   - Graceful shutdown on SIGTERM / SIGINT

use std::io::BufRead;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use psdash::AppState;
use psdash::auth::users;
use psdash::config::Config;
use psdash::db::Database;
use psdash::server::{build_app, shutdown_signal};

// ---------------------------------------------------------------------------
// CLI argument parsing (minimal, no clap dependency)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config_path: Option<PathBuf>,
    dbcreate: bool,
    run: bool,
    add_user: Option<NewUser>,
    set_password: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
struct NewUser {
    username: String,
    name: String,
    email: Option<String>,
}

impl CliArgs {
    /// Serve unless only administrative actions were requested.
    fn should_serve(&self) -> bool {
        self.run || (!self.dbcreate && self.add_user.is_none() && self.set_password.is_none())
    }
}

fn parse_args() -> CliArgs {
    match parse_from(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => std::process::exit(0),
        Err(msg) => {
            eprintln!("Error: {msg}");
            eprintln!("Run with --help for usage information.");
            std::process::exit(1);
        }
    }
}

/// Parse arguments. `Ok(None)` means help or version was printed.
fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Option<CliArgs>, String> {
    let mut args = args.into_iter();
    let mut cli = CliArgs::default();
    let mut name = None;
    let mut email = None;
    let mut new_username = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or("--config requires a path argument")?;
                cli.config_path = Some(PathBuf::from(path));
            }
            "--dbcreate" => cli.dbcreate = true,
            "--run" => cli.run = true,
            "--add-user" => {
                new_username = Some(args.next().ok_or("--add-user requires a username")?);
            }
            "--name" => name = Some(args.next().ok_or("--name requires a value")?),
            "--email" => email = Some(args.next().ok_or("--email requires a value")?),
            "--set-password" => {
                cli.set_password = Some(args.next().ok_or("--set-password requires a username")?);
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            "--version" | "-V" => {
                println!("psdash {}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
    }

    if let Some(username) = new_username {
        let name = name.ok_or("--add-user requires --name")?;
        cli.add_user = Some(NewUser { username, name, email });
    } else if name.is_some() || email.is_some() {
        return Err("--name and --email are only valid with --add-user".to_string());
    }
    Ok(Some(cli))
}

fn print_usage() {
    println!(
        "\
psdash {version} -- proxy service dashboard

USAGE:
    psdash [OPTIONS]

OPTIONS:
    -c, --config <PATH>          Path to configuration file [default: psdash.toml]
        --dbcreate               Create the user table (exits unless --run is also given)
        --run                    Run the web server (default when no other action is given)
        --add-user <USERNAME>    Create a user; requires --name, accepts --email
        --name <NAME>            Display name for --add-user
        --email <EMAIL>          Email address for --add-user
        --set-password <USERNAME>
                                 Change the password of an existing user
    -h, --help                   Print this help message
    -V, --version                Print version information

ENVIRONMENT:
    RUST_LOG                     Override log level (e.g. RUST_LOG=debug)
    PSDASH_CONFIG                Alternative to --config flag
    PSDASH_PASSWORD              Password for --add-user / --set-password
                                 (otherwise read from the first line of stdin)
",
        version = env!("CARGO_PKG_VERSION")
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse CLI arguments
    let cli = parse_args();

    // Allow PSDASH_CONFIG env var as alternative to --config flag
    let config_path = cli
        .config_path
        .clone()
        .or_else(|| std::env::var("PSDASH_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("psdash.toml"));

    // 2. Load configuration
    let config = Config::load(&config_path)?;

    // 3. Initialize tracing/logging
    init_tracing(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "Starting psdash"
    );
    for (key, var) in config.env_overrides.all() {
        tracing::info!(setting = %key, env = %var, "Setting overridden from environment");
    }

    // 4. Open database
    let db = Database::open(&config.database.path)?;
    tracing::info!(path = %config.database.path.display(), "Database opened");

    // 5. Administrative actions
    if cli.dbcreate {
        db.create_schema()?;
        tracing::info!("User table created");
    }
    if let Some(new_user) = &cli.add_user {
        db.create_schema()?;
        let password = read_password()?;
        users::create_user(
            &db,
            &new_user.username,
            &password,
            &new_user.name,
            new_user.email.as_deref(),
        )?;
    }
    if let Some(username) = &cli.set_password {
        let password = read_password()?;
        users::change_password(&db, username, &password)?;
    }
    if !cli.should_serve() {
        return Ok(());
    }

    // 6. Serve
    config.validate()?;
    db.create_schema()?;
    if users::count_users(&db)? == 0 {
        tracing::warn!("No users exist yet; create one with --add-user");
    }

    let listen_addr = config.listen_addr();
    let state = AppState::new(config, db)?;
    tracing::info!(api = %state.api.base_url(), "Proxy service API configured");
    let app = build_app(state);

    let listener = TcpListener::bind(&listen_addr).await?;
    tracing::info!(addr = %listen_addr, "Listening");

    println!();
    println!("  psdash v{} is running", env!("CARGO_PKG_VERSION"));
    println!("  Dashboard: http://{listen_addr}/dashboard");
    println!("  Health:    http://{listen_addr}/health");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully");
    Ok(())
}

/// Password for user commands: `PSDASH_PASSWORD`, else the first stdin line.
fn read_password() -> anyhow::Result<String> {
    if let Ok(password) = std::env::var("PSDASH_PASSWORD") {
        return Ok(password);
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("No password given (set PSDASH_PASSWORD or pipe it on stdin)");
    }
    Ok(password)
}

// ---------------------------------------------------------------------------
// Tracing initialization
// ---------------------------------------------------------------------------

/// Set up the tracing subscriber based on configuration.
fn init_tracing(config: &Config) {
    // RUST_LOG env var takes precedence over config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        EnvFilter::new(format!("psdash={level},tower_http={level},warn"))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<CliArgs>, String> {
        parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_print_usage_does_not_panic() {
        print_usage();
    }

    #[test]
    fn test_no_arguments_serves() {
        let cli = parse(&[]).unwrap().unwrap();
        assert_eq!(cli, CliArgs::default());
        assert!(cli.should_serve());
    }

    #[test]
    fn test_dbcreate_alone_exits() {
        let cli = parse(&["--dbcreate"]).unwrap().unwrap();
        assert!(cli.dbcreate);
        assert!(!cli.should_serve());
        let cli = parse(&["--dbcreate", "--run"]).unwrap().unwrap();
        assert!(cli.should_serve());
    }

    #[test]
    fn test_add_user() {
        let cli = parse(&["-c", "x.toml", "--add-user", "ada", "--name", "Ada", "--email", "a@x.io"])
            .unwrap()
            .unwrap();
        assert_eq!(cli.config_path, Some(PathBuf::from("x.toml")));
        assert_eq!(
            cli.add_user,
            Some(NewUser {
                username: "ada".into(),
                name: "Ada".into(),
                email: Some("a@x.io".into()),
            })
        );
        assert!(!cli.should_serve());
    }

    #[test]
    fn test_add_user_requires_name() {
        assert!(parse(&["--add-user", "ada"]).is_err());
        assert!(parse(&["--name", "Ada"]).is_err());
    }

    #[test]
    fn test_missing_values_and_unknown_flags() {
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--set-password"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }

    #[test]
    fn test_help_and_version_stop() {
        assert_eq!(parse(&["--help"]).unwrap(), None);
        assert_eq!(parse(&["-V"]).unwrap(), None);
    }
}
