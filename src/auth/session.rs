use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::auth::users::map_user;
use crate::db::models::User;

/// Create a new session for a user. Returns the session token.
pub fn create_session(conn: &Connection, user_id: &str, hours: u64) -> rusqlite::Result<String> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Delete every session of a user except the one with `keep_token`.
pub fn delete_other_sessions(
    conn: &Connection,
    user_id: &str,
    keep_token: Option<&str>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM sessions WHERE user_id = ?1 AND token IS NOT ?2",
        params![user_id, keep_token],
    )
}

/// Resolve an unexpired session token to its user.
pub fn find_user(conn: &Connection, token: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
                u.is_admin, u.created_at
         FROM sessions s
         JOIN users u ON u.id = s.user_id
         WHERE s.token = ?1 AND s.expires_at > datetime('now')",
        params![token],
        map_user,
    )
    .optional()
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
