use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::User;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, is_admin, created_at";

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub(crate) fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        password_hash: row.get(5)?,
        is_admin: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn insert(
    conn: &Connection,
    profile: &Profile,
    password_hash: &str,
    is_admin: bool,
) -> rusqlite::Result<User> {
    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_admin)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            profile.username,
            profile.email,
            profile.first_name,
            profile.last_name,
            password_hash,
            is_admin
        ],
    )?;

    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        map_user,
    )
}

pub fn find_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        map_user,
    )
    .optional()
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
        params![username],
        map_user,
    )
    .optional()
}

/// Whether another account already uses `username`.
pub fn username_taken(
    conn: &Connection,
    username: &str,
    except_id: Option<&str>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1 AND id != ?2",
        params![username, except_id.unwrap_or("")],
        |row| row.get(0),
    )
}

pub fn update_profile(conn: &Connection, id: &str, profile: &Profile) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE users SET username = ?1, email = ?2, first_name = ?3, last_name = ?4
         WHERE id = ?5",
        params![
            profile.username,
            profile.email,
            profile.first_name,
            profile.last_name,
            id
        ],
    )
}

pub fn set_password_hash(conn: &Connection, id: &str, password_hash: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE id = ?2",
        params![password_hash, id],
    )
}
