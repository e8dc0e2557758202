use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};

use crate::blog::slug::category_slug;
use crate::blog::{categories, posts};
use crate::db::models::{Category, Post};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::state::AppState;

// --- View structs ---

/// A post as shown in a list.
pub struct PostCard {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub category_title: String,
    pub category_slug: String,
    pub posted: String,
    pub snippet: String,
    pub can_edit: bool,
}

impl PostCard {
    pub fn new(post: Post, viewer: Option<&CurrentUser>) -> Self {
        let can_edit = viewer.is_some_and(|user| can_modify(&post, user));
        Self {
            id: post.id,
            author: post.author_username.unwrap_or_default(),
            category_slug: category_slug(&post.category_title),
            posted: format_relative_time(&post.post_date_time),
            title: post.title,
            category_title: post.category_title,
            snippet: post.snippet,
            can_edit,
        }
    }
}

/// One entry of the category menu.
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<Category> for MenuItem {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            slug: category_slug(&category.name),
            name: category.name,
        }
    }
}

pub fn category_menu(conn: &rusqlite::Connection) -> AppResult<Vec<MenuItem>> {
    Ok(categories::list_all(conn)?
        .into_iter()
        .map(MenuItem::from)
        .collect())
}

/// Authors may change their own posts; admins may change any post.
pub fn can_modify(post: &Post, user: &CurrentUser) -> bool {
    user.is_admin || post.author_id.as_deref() == Some(user.id.as_str())
}

// --- Templates ---

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub username: Option<String>,
    pub posts: Vec<PostCard>,
    pub cat_menu: Vec<MenuItem>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// GET /: every post, most recently saved first.
pub async fn index(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
) -> AppResult<Html<HomeTemplate>> {
    let (posts, cat_menu) = {
        let conn = state.db.get()?;
        (posts::list_all(&conn)?, category_menu(&conn)?)
    };

    let posts = posts
        .into_iter()
        .map(|post| PostCard::new(post, maybe_user.0.as_ref()))
        .collect();

    Ok(Html(HomeTemplate {
        username: maybe_user.username(),
        posts,
        cat_menu,
    }))
}

// --- Time formatting ---

pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let diff = Utc::now().signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(author_id: Option<&str>) -> Post {
        Post {
            id: 1,
            title: "T".into(),
            title_tag: "T".into(),
            author_id: author_id.map(String::from),
            author_username: author_id.map(String::from),
            body: None,
            post_date_time: Utc::now(),
            category_title: "My Tag".into(),
            snippet: "s".into(),
        }
    }

    fn user(id: &str, is_admin: bool) -> CurrentUser {
        CurrentUser {
            id: id.into(),
            username: id.into(),
            is_admin,
        }
    }

    #[test]
    fn format_relative_time_just_now() {
        assert_eq!(format_relative_time(&Utc::now()), "just now");
    }

    #[test]
    fn format_relative_time_minutes() {
        let dt = Utc::now() - chrono::Duration::minutes(5);
        assert_eq!(format_relative_time(&dt), "5m ago");
    }

    #[test]
    fn format_relative_time_hours() {
        let dt = Utc::now() - chrono::Duration::hours(3);
        assert_eq!(format_relative_time(&dt), "3h ago");
    }

    #[test]
    fn format_relative_time_days() {
        let dt = Utc::now() - chrono::Duration::days(2);
        assert_eq!(format_relative_time(&dt), "2d ago");
    }

    #[test]
    fn format_relative_time_old_date() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(&dt), "Jan 15, 2025");
    }

    #[test]
    fn only_author_or_admin_can_modify() {
        let p = post(Some("alice"));
        assert!(can_modify(&p, &user("alice", false)));
        assert!(can_modify(&p, &user("bob", true)));
        assert!(!can_modify(&p, &user("bob", false)));
        assert!(!can_modify(&post(None), &user("bob", false)));
    }

    #[test]
    fn post_card_links_to_category_slug() {
        let card = PostCard::new(post(Some("alice")), None);
        assert_eq!(card.category_slug, "my-tag");
        assert!(!card.can_edit);
    }
}
