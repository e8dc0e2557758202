use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default label for posts submitted without a category.
pub const DEFAULT_CATEGORY: &str = "Other";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub title_tag: String,
    /// None once the author reference is cleared; deleting the user removes
    /// the post entirely.
    pub author_id: Option<String>,
    pub author_username: Option<String>,
    pub body: Option<String>,
    /// Refreshed on every save, so it doubles as the feed's sort key.
    pub post_date_time: DateTime<Utc>,
    pub category_title: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginCounter {
    pub user_id: String,
    pub login_count: i64,
}
