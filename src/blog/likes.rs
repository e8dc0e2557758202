use rusqlite::{params, Connection, TransactionBehavior};

use crate::error::{AppError, AppResult};

/// State of a post's likes right after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    /// Whether the requesting user is now in the liker set.
    pub liked: bool,
    pub total_likes: i64,
}

/// Flip `user_id`'s membership in the post's liker set.
///
/// The existence check, the flip and the recount share one write transaction.
/// An unknown post fails with `NotFound` before anything is written.
pub fn toggle_like(conn: &mut Connection, post_id: i64, user_id: &str) -> AppResult<LikeOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let post_exists: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;
    if !post_exists {
        return Err(AppError::NotFound);
    }

    let liked = if has_liked(&tx, post_id, user_id)? {
        tx.execute(
            "DELETE FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
            params![post_id, user_id],
        )?;
        false
    } else {
        tx.execute(
            "INSERT INTO post_likes (post_id, user_id) VALUES (?1, ?2)",
            params![post_id, user_id],
        )?;
        true
    };

    let total_likes = total_likes(&tx, post_id)?;
    tx.commit()?;

    tracing::info!(post_id, user_id, liked, total_likes, "like toggled");
    Ok(LikeOutcome { liked, total_likes })
}

pub fn total_likes(conn: &Connection, post_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )
}

pub fn has_liked(conn: &Connection, post_id: i64, user_id: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
        params![post_id, user_id],
        |row| row.get(0),
    )
}

/// User ids in the liker set, in no particular order.
pub fn likers(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT user_id FROM post_likes WHERE post_id = ?1")?;
    let ids = stmt
        .query_map(params![post_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}
