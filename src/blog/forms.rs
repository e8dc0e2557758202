use serde::Deserialize;
use validator::Validate;

use crate::blog::slug::normalize_category_name;
use crate::db::models::DEFAULT_CATEGORY;
use crate::forms::FieldErrors;

/// Post authoring form. The author is never a form field; it is always the
/// signed-in user.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub title_tag: String,
    #[validate(length(max = 255))]
    pub category_title: String,
    pub body: String,
    #[validate(length(min = 1, max = 255))]
    pub snippet: String,
}

/// Edit form. Author and category are fixed once a post exists.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct EditForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub title_tag: String,
    pub body: String,
    #[validate(length(min = 1, max = 255))]
    pub snippet: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub title_tag: String,
    pub category_title: String,
    pub body: Option<String>,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
    pub title: String,
    pub title_tag: String,
    pub body: Option<String>,
    pub snippet: String,
}

impl PostForm {
    pub fn clean(&self) -> Result<NewPost, FieldErrors> {
        let category_title = match normalize_category_name(&self.category_title) {
            name if name.is_empty() => DEFAULT_CATEGORY.to_string(),
            name => name,
        };
        let form = PostForm {
            title: self.title.trim().to_string(),
            title_tag: self.title_tag.trim().to_string(),
            category_title,
            body: self.body.clone(),
            snippet: self.snippet.trim().to_string(),
        };
        form.validate()?;

        Ok(NewPost {
            body: rich_text(&form.body),
            title: form.title,
            title_tag: form.title_tag,
            category_title: form.category_title,
            snippet: form.snippet,
        })
    }
}

impl EditForm {
    pub fn clean(&self) -> Result<PostEdit, FieldErrors> {
        let form = EditForm {
            title: self.title.trim().to_string(),
            title_tag: self.title_tag.trim().to_string(),
            body: self.body.clone(),
            snippet: self.snippet.trim().to_string(),
        };
        form.validate()?;

        Ok(PostEdit {
            body: rich_text(&form.body),
            title: form.title,
            title_tag: form.title_tag,
            snippet: form.snippet,
        })
    }
}

impl CategoryForm {
    /// The category name, whitespace-normalized.
    pub fn clean(&self) -> Result<String, FieldErrors> {
        let form = CategoryForm {
            name: normalize_category_name(&self.name),
        };
        form.validate()?;
        Ok(form.name)
    }
}

/// Sanitized rich text. Formatting and images survive; scripts, event
/// handler attributes and `javascript:` links do not. Nothing left counts as
/// no body.
pub fn rich_text(body: &str) -> Option<String> {
    let cleaned = ammonia::clean(body);
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
