use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::blog::forms::{NewPost, PostEdit};
use crate::blog::likes;
use crate::blog::slug::slug_to_category_title;
use crate::db::models::Post;
use crate::db::{format_timestamp, parse_timestamp};
use crate::error::{AppError, AppResult};

const POST_SELECT: &str = "SELECT p.id, p.title, p.title_tag, p.author_id, u.username, p.body,
        p.post_date_time, p.category_title, p.snippet
 FROM posts p
 LEFT JOIN users u ON u.id = p.author_id";

/// Newest save first; id breaks ties between saves in the same microsecond.
const FEED_ORDER: &str = "ORDER BY p.post_date_time DESC, p.id DESC";

/// A post together with its like state for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDetail {
    pub post: Post,
    pub total_likes: i64,
    /// Always false for anonymous viewers.
    pub liked: bool,
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let raw_date: String = row.get(6)?;
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        title_tag: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row.get(4)?,
        body: row.get(5)?,
        post_date_time: parse_timestamp(6, &raw_date)?,
        category_title: row.get(7)?,
        snippet: row.get(8)?,
    })
}

pub fn create(
    conn: &Connection,
    new_post: &NewPost,
    author_id: &str,
    now: DateTime<Utc>,
) -> AppResult<Post> {
    conn.execute(
        "INSERT INTO posts (title, title_tag, author_id, body, post_date_time, category_title, snippet)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new_post.title,
            new_post.title_tag,
            author_id,
            new_post.body,
            format_timestamp(now),
            new_post.category_title,
            new_post.snippet
        ],
    )?;
    let post = get(conn, conn.last_insert_rowid())?;
    tracing::info!(id = post.id, category = %post.category_title, "post created");
    Ok(post)
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Post> {
    conn.query_row(
        &format!("{} WHERE p.id = ?1", POST_SELECT),
        params![id],
        map_post,
    )
    .optional()?
    .ok_or(AppError::NotFound)
}

pub fn get_detail(conn: &Connection, id: i64, viewer_id: Option<&str>) -> AppResult<PostDetail> {
    let post = get(conn, id)?;
    let total_likes = likes::total_likes(conn, id)?;
    let liked = match viewer_id {
        Some(user_id) => likes::has_liked(conn, id, user_id)?,
        None => false,
    };
    Ok(PostDetail {
        post,
        total_likes,
        liked,
    })
}

/// The home feed: every post, most recently saved first.
pub fn list_all(conn: &Connection) -> AppResult<Vec<Post>> {
    let mut stmt = conn.prepare(&format!("{} {}", POST_SELECT, FEED_ORDER))?;
    let posts = stmt
        .query_map([], map_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Posts whose `category_title` matches the slug once hyphens become
/// spaces. Case is folded in Rust rather than by SQLite, whose NOCASE
/// collation only knows ASCII.
pub fn list_by_category_slug(conn: &Connection, slug: &str) -> AppResult<Vec<Post>> {
    let wanted = slug_to_category_title(slug).to_lowercase();
    Ok(list_all(conn)?
        .into_iter()
        .filter(|post| post.category_title.to_lowercase() == wanted)
        .collect())
}

/// Apply an edit. Every save refreshes `post_date_time`, which moves the post
/// to the top of the feed.
pub fn update(conn: &Connection, id: i64, edit: &PostEdit, now: DateTime<Utc>) -> AppResult<Post> {
    let changed = conn.execute(
        "UPDATE posts SET title = ?1, title_tag = ?2, body = ?3, snippet = ?4, post_date_time = ?5
         WHERE id = ?6",
        params![
            edit.title,
            edit.title_tag,
            edit.body,
            edit.snippet,
            format_timestamp(now),
            id
        ],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(id, "post updated");
    get(conn, id)
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    if conn.execute("DELETE FROM posts WHERE id = ?1", params![id])? == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!(id, "post deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::DEFAULT_CATEGORY;
    use crate::db::MIGRATIONS;
    use chrono::{Duration, TimeZone};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        for (_, sql) in MIGRATIONS {
            conn.execute_batch(sql).unwrap();
        }
        conn.execute(
            "INSERT INTO users (id, username, password_hash) VALUES ('u1', 'ada', 'x')",
            [],
        )
        .unwrap();
        conn
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn new_post(title: &str, category: &str) -> NewPost {
        NewPost {
            title: title.into(),
            title_tag: title.into(),
            category_title: category.into(),
            body: None,
            snippet: format!("{} snippet", title),
        }
    }

    #[test]
    fn create_records_author_and_timestamp() {
        let conn = conn();
        let post = create(&conn, &new_post("Hello", DEFAULT_CATEGORY), "u1", t0()).unwrap();

        assert_eq!(post.author_id.as_deref(), Some("u1"));
        assert_eq!(post.author_username.as_deref(), Some("ada"));
        assert_eq!(post.post_date_time, t0());
        assert_eq!(post.category_title, "Other");
    }

    #[test]
    fn missing_post_is_not_found() {
        let conn = conn();
        assert!(matches!(get(&conn, 42), Err(AppError::NotFound)));
        assert!(matches!(delete(&conn, 42), Err(AppError::NotFound)));
        let edit = PostEdit {
            title: "t".into(),
            title_tag: "t".into(),
            body: None,
            snippet: "s".into(),
        };
        assert!(matches!(
            update(&conn, 42, &edit, t0()),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn update_keeps_author_and_category() {
        let conn = conn();
        let post = create(&conn, &new_post("Hello", "Sports"), "u1", t0()).unwrap();

        let edit = PostEdit {
            title: "Hello again".into(),
            title_tag: "Again".into(),
            body: Some("<p>more</p>".into()),
            snippet: "new snippet".into(),
        };
        let later = t0() + Duration::minutes(5);
        let updated = update(&conn, post.id, &edit, later).unwrap();

        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.body.as_deref(), Some("<p>more</p>"));
        assert_eq!(updated.category_title, "Sports");
        assert_eq!(updated.author_id.as_deref(), Some("u1"));
        assert_eq!(updated.post_date_time, later);
    }

    #[test]
    fn feed_is_newest_first_and_ties_break_by_id() {
        let conn = conn();
        let a = create(&conn, &new_post("A", "x"), "u1", t0()).unwrap();
        let b = create(&conn, &new_post("B", "x"), "u1", t0()).unwrap();
        let c = create(&conn, &new_post("C", "x"), "u1", t0() + Duration::seconds(1)).unwrap();

        let ids: Vec<i64> = list_all(&conn).unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn delete_removes_post_and_its_likes() {
        let conn = conn();
        let post = create(&conn, &new_post("A", "x"), "u1", t0()).unwrap();
        conn.execute(
            "INSERT INTO post_likes (post_id, user_id) VALUES (?1, 'u1')",
            params![post.id],
        )
        .unwrap();

        delete(&conn, post.id).unwrap();
        let likes: i64 = conn
            .query_row("SELECT COUNT(*) FROM post_likes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(likes, 0);
    }

    #[test]
    fn detail_for_anonymous_viewer_is_never_liked() {
        let conn = conn();
        let post = create(&conn, &new_post("A", "x"), "u1", t0()).unwrap();
        conn.execute(
            "INSERT INTO post_likes (post_id, user_id) VALUES (?1, 'u1')",
            params![post.id],
        )
        .unwrap();

        let anonymous = get_detail(&conn, post.id, None).unwrap();
        assert_eq!(anonymous.total_likes, 1);
        assert!(!anonymous.liked);

        let author = get_detail(&conn, post.id, Some("u1")).unwrap();
        assert!(author.liked);
    }
}
