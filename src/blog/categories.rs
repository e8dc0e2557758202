//! Category registry. Names are free-form labels: duplicates are allowed and
//! removing a category leaves posts that copied its name untouched.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Category;
use crate::error::{AppError, AppResult};

pub fn create(conn: &Connection, name: &str) -> AppResult<Category> {
    conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name])?;
    let category = Category {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    };
    tracing::info!(id = category.id, name = %category.name, "category created");
    Ok(category)
}

/// Every category, oldest first.
pub fn list_all(conn: &Connection) -> AppResult<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id ASC")?;
    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Category> {
    conn.query_row(
        "SELECT id, name FROM categories WHERE id = ?1",
        params![id],
        |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(AppError::NotFound)
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    if conn.execute("DELETE FROM categories WHERE id = ?1", params![id])? == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(id, "category deleted");
    Ok(())
}
