use rusqlite::{OptionalExtension, Row, params};
use serde::Serialize;

use crate::auth::password;
use crate::db::Database;
use crate::error::AppError;

/// Longest username the user table accepts.
pub const MAX_USERNAME_LEN: usize = 32;

/// Stored user record. The password hash never leaves this module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub email: Option<String>,
}

const USER_COLUMNS: &str = "id, username, name, email";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
    })
}

// ---------------------------------------------------------------------------
// User CRUD
// ---------------------------------------------------------------------------

/// Create a new user with an argon2-hashed password.
pub fn create_user(
    db: &Database,
    username: &str,
    password: &str,
    name: &str,
    email: Option<&str>,
) -> Result<User, AppError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Username must be between 1 and {MAX_USERNAME_LEN} characters"
        )));
    }
    if password.is_empty() {
        return Err(AppError::BadRequest("Password must not be empty".to_string()));
    }
    let email = email.map(str::trim).filter(|e| !e.is_empty());

    let hash = password::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;

    let user = db
        .with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password, name, email) VALUES (?1, ?2, ?3, ?4)",
                params![username, hash, name, email],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
        })
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                AppError::BadRequest(format!("Username or email already in use: {username}"))
            }
            other => AppError::from(other),
        })?;

    tracing::info!(user_id = user.id, username = %user.username, "User created");
    Ok(user)
}

/// Get a single user by ID.
pub fn get_user(db: &Database, user_id: i64) -> Result<User, AppError> {
    db.with_conn(|conn| {
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![user_id],
            user_from_row,
        )
        .optional()
    })?
    .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

/// Get a single user by username.
pub fn get_user_by_username(db: &Database, username: &str) -> Result<User, AppError> {
    db.with_conn(|conn| {
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
    })?
    .ok_or_else(|| AppError::NotFound(format!("User not found: {username}")))
}

/// Number of stored users.
pub fn count_users(db: &Database) -> Result<i64, AppError> {
    Ok(db.with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0)))?)
}

/// Check a username/password pair.
///
/// Returns `Ok(None)` for both an unknown username and a wrong password; the
/// unknown case still pays for one argon2 verification.
pub fn authenticate(db: &Database, username: &str, password: &str) -> Result<Option<User>, AppError> {
    let found = db.with_conn(|conn| {
        conn.query_row(
            &format!("SELECT {USER_COLUMNS}, password FROM users WHERE username = ?1"),
            params![username],
            |row| Ok((user_from_row(row)?, row.get::<_, String>(4)?)),
        )
        .optional()
    })?;

    match found {
        Some((user, hash)) if password::verify_password(password, &hash) => Ok(Some(user)),
        Some(_) => Ok(None),
        None => {
            password::verify_dummy(password);
            Ok(None)
        }
    }
}

/// [`authenticate`] on the blocking pool, so argon2 never runs on an async
/// worker thread.
pub async fn verify_login(db: &Database, username: &str, password: &str) -> Result<Option<User>, AppError> {
    let db = db.clone();
    let (username, password) = (username.to_string(), password.to_string());
    tokio::task::spawn_blocking(move || authenticate(&db, &username, &password))
        .await
        .map_err(|e| AppError::Internal(format!("Password check task failed: {e}")))?
}

/// Replace a user's password.
pub fn change_password(db: &Database, username: &str, new_password: &str) -> Result<(), AppError> {
    if new_password.is_empty() {
        return Err(AppError::BadRequest("Password must not be empty".to_string()));
    }
    let hash = password::hash_password(new_password)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;

    let updated = db.with_conn(|conn| {
        conn.execute(
            "UPDATE users SET password = ?1 WHERE username = ?2",
            params![hash, username],
        )
    })?;
    if updated == 0 {
        return Err(AppError::NotFound(format!("User not found: {username}")));
    }

    tracing::info!(username = %username, "Password changed");
    Ok(())
}
