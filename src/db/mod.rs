pub mod models;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_initial",
        include_str!("../../migrations/001_initial.sql"),
    ),
    ("002_blog", include_str!("../../migrations/002_blog.sql")),
    (
        "003_login_counters",
        include_str!("../../migrations/003_login_counters.sql"),
    ),
];

/// Per-connection settings. `foreign_keys` is connection scoped in SQLite, so
/// it has to be applied to every pooled connection, not just the first one.
fn init_connection(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )
}

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);
    let pool = Pool::builder().max_size(8).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    // Create migrations tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

/// Timestamps are stored as fixed-width RFC 3339 UTC text so that string
/// order in SQL matches chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(column: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        Pool::builder().max_size(1).build(manager).unwrap()
    }

    fn insert_user(conn: &rusqlite::Connection, id: &str, username: &str) {
        conn.execute(
            "INSERT INTO users (id, username, password_hash) VALUES (?1, ?2, 'x')",
            params![id, username],
        )
        .unwrap();
    }

    #[test]
    fn create_pool_creates_db_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("sub/dir/test.db");
        let pool = create_pool(&db_path).unwrap();
        assert!(db_path.exists());
        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn every_pooled_connection_enforces_foreign_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = create_pool(&tmp.path().join("fk.db")).unwrap();

        let first = pool.get().unwrap();
        let second = pool.get().unwrap();
        for conn in [&first, &second] {
            let enabled: bool = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert!(enabled);
        }
    }

    #[test]
    fn migrations_run_successfully() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);

        let tables: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .filter_map(|r| r.ok())
                .collect()
        };
        for table in [
            "users",
            "sessions",
            "categories",
            "posts",
            "post_likes",
            "login_counters",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn category_title_defaults_to_other() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO posts (title, title_tag, post_date_time, snippet)
             VALUES ('t', 'tt', '2025-01-01T00:00:00.000000Z', 's')",
            [],
        )
        .unwrap();
        let category: String = conn
            .query_row("SELECT category_title FROM posts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(category, "Other");
    }

    #[test]
    fn post_likes_reject_duplicate_membership() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        insert_user(&conn, "u1", "alice");
        conn.execute(
            "INSERT INTO posts (title, title_tag, post_date_time, snippet)
             VALUES ('t', 'tt', '2025-01-01T00:00:00.000000Z', 's')",
            [],
        )
        .unwrap();
        let post_id = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO post_likes (post_id, user_id) VALUES (?1, 'u1')",
            params![post_id],
        )
        .unwrap();
        let again = conn.execute(
            "INSERT INTO post_likes (post_id, user_id) VALUES (?1, 'u1')",
            params![post_id],
        );
        assert!(again.is_err());
    }

    #[test]
    fn deleting_a_user_cascades_to_posts_likes_and_counter() {
        let pool = test_pool();
        run_migrations(&pool).unwrap();

        let conn = pool.get().unwrap();
        insert_user(&conn, "u1", "alice");
        conn.execute(
            "INSERT INTO posts (title, title_tag, author_id, post_date_time, snippet)
             VALUES ('t', 'tt', 'u1', '2025-01-01T00:00:00.000000Z', 's')",
            [],
        )
        .unwrap();
        let post_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO post_likes (post_id, user_id) VALUES (?1, 'u1')",
            params![post_id],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO login_counters (user_id, login_count) VALUES ('u1', 0)",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM users WHERE id = 'u1'", []).unwrap();

        for table in ["posts", "post_likes", "login_counters"] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .unwrap();
            assert_eq!(count, 0, "{} should be empty", table);
        }
    }

    #[test]
    fn timestamps_sort_lexicographically() {
        let earlier = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(
            parse_timestamp(0, &format_timestamp(later)).unwrap(),
            later
        );
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp(3, "not-a-date").is_err());
    }
}
