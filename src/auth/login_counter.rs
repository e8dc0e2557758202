//! Per-user tally of successful sign-ins.
//!
//! Two independent handlers feed the counter: one when an account is created
//! and one on every successful login.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::LoginCounter;

/// A fresh account starts with a zero counter.
pub fn on_user_created(conn: &Connection, user_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO login_counters (user_id, login_count) VALUES (?1, 0)",
        params![user_id],
    )?;
    tracing::debug!(user_id, "login counter created");
    Ok(())
}

/// Count one successful login and return the new total.
///
/// Accounts without a counter row (created before counting existed, e.g. a
/// bootstrap admin) get a row that starts at 1.
pub fn on_login_succeeded(conn: &Connection, user_id: &str) -> rusqlite::Result<i64> {
    match get(conn, user_id)? {
        None => {
            conn.execute(
                "INSERT INTO login_counters (user_id, login_count) VALUES (?1, 1)",
                params![user_id],
            )?;
            Ok(1)
        }
        Some(counter) => {
            let login_count = counter.login_count + 1;
            conn.execute(
                "UPDATE login_counters SET login_count = ?1 WHERE user_id = ?2",
                params![login_count, user_id],
            )?;
            Ok(login_count)
        }
    }
}

pub fn get(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<LoginCounter>> {
    conn.query_row(
        "SELECT user_id, login_count FROM login_counters WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(LoginCounter {
                user_id: row.get(0)?,
                login_count: row.get(1)?,
            })
        },
    )
    .optional()
}
