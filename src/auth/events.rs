use rusqlite::Connection;

use crate::auth::login_counter;

/// Account lifecycle signals raised at the auth boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    UserCreated { user_id: String },
    LoginSucceeded { user_id: String },
}

/// Deliver an event to its subscribers on the caller's connection, so the
/// subscriber's writes commit or roll back with the triggering change.
pub fn publish(conn: &Connection, event: &AccountEvent) -> rusqlite::Result<()> {
    tracing::debug!(?event, "account event");
    match event {
        AccountEvent::UserCreated { user_id } => login_counter::on_user_created(conn, user_id),
        AccountEvent::LoginSucceeded { user_id } => {
            let count = login_counter::on_login_succeeded(conn, user_id)?;
            tracing::info!(user_id = %user_id, login_count = count, "login recorded");
            Ok(())
        }
    }
}
