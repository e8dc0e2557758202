use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::Utc;

use crate::blog::forms::{rich_text, EditForm, PostForm};
use crate::blog::slug::category_slug;
use crate::blog::{categories, likes, posts};
use crate::db::models::Post;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::FieldErrors;
use crate::routes::home::{can_modify, category_menu, format_relative_time, Html, MenuItem};
use crate::state::AppState;

// --- View structs ---

pub struct CategoryChoice {
    pub name: String,
    pub selected: bool,
}

// --- Templates ---

#[derive(Template)]
#[template(path = "article_details.html")]
pub struct ArticleTemplate {
    pub username: Option<String>,
    pub post: Post,
    pub author: String,
    pub posted: String,
    pub body: String,
    pub category_slug: String,
    pub cat_menu: Vec<MenuItem>,
    pub total_likes: i64,
    pub liked: bool,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "add_post.html")]
pub struct AddPostTemplate {
    pub username: Option<String>,
    pub form: PostForm,
    pub choices: Vec<CategoryChoice>,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "update_post.html")]
pub struct UpdatePostTemplate {
    pub username: Option<String>,
    pub post_id: i64,
    pub form: EditForm,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "delete_post.html")]
pub struct DeletePostTemplate {
    pub username: Option<String>,
    pub post_id: i64,
    pub title: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/article/{id}", get(article_detail))
        .route("/add_post/", get(add_post_page).post(add_post))
        .route("/article/edit/{id}", get(edit_post_page).post(edit_post))
        .route("/article/{id}/remove", get(delete_post_page).post(delete_post))
        .route("/like/{id}", post(like_post))
}

// --- Handlers ---

/// GET /article/{id}: one post with its like count and the viewer's like state.
async fn article_detail(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<Html<ArticleTemplate>> {
    let (detail, cat_menu) = {
        let conn = state.db.get()?;
        (
            posts::get_detail(&conn, id, maybe_user.id())?,
            category_menu(&conn)?,
        )
    };

    let can_edit = maybe_user
        .0
        .as_ref()
        .is_some_and(|user| can_modify(&detail.post, user));
    let post = detail.post;

    Ok(Html(ArticleTemplate {
        username: maybe_user.username(),
        author: post.author_username.clone().unwrap_or_default(),
        posted: format_relative_time(&post.post_date_time),
        body: post.body.as_deref().and_then(rich_text).unwrap_or_default(),
        category_slug: category_slug(&post.category_title),
        post,
        cat_menu,
        total_likes: detail.total_likes,
        liked: detail.liked,
        can_edit,
    }))
}

async fn add_post_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Html<AddPostTemplate>> {
    let form = PostForm::default();
    let choices = category_choices(&state, &form.category_title)?;
    Ok(Html(AddPostTemplate {
        username: Some(user.username),
        form,
        choices,
        errors: FieldErrors::default(),
    }))
}

/// POST /add_post/: the author is always the signed-in user.
async fn add_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let new_post = match form.clean() {
        Ok(new_post) => new_post,
        Err(errors) => {
            let choices = category_choices(&state, &form.category_title)?;
            let page = AddPostTemplate {
                username: Some(user.username),
                form,
                choices,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response());
        }
    };

    {
        let conn = state.db.get()?;
        posts::create(&conn, &new_post, &user.id, Utc::now())?;
    }

    Ok(Redirect::to("/").into_response())
}

async fn edit_post_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Html<UpdatePostTemplate>> {
    let post = load_modifiable(&state, id, &user)?;
    Ok(Html(UpdatePostTemplate {
        username: Some(user.username),
        post_id: id,
        form: EditForm {
            title: post.title,
            title_tag: post.title_tag,
            body: post.body.unwrap_or_default(),
            snippet: post.snippet,
        },
        errors: FieldErrors::default(),
    }))
}

/// POST /article/edit/{id}: saving refreshes the post's timestamp.
async fn edit_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<EditForm>,
) -> AppResult<Response> {
    load_modifiable(&state, id, &user)?;

    let edit = match form.clean() {
        Ok(edit) => edit,
        Err(errors) => {
            let page = UpdatePostTemplate {
                username: Some(user.username),
                post_id: id,
                form,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response());
        }
    };

    {
        let conn = state.db.get()?;
        posts::update(&conn, id, &edit, Utc::now())?;
    }

    Ok(Redirect::to("/").into_response())
}

async fn delete_post_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Html<DeletePostTemplate>> {
    let post = load_modifiable(&state, id, &user)?;
    Ok(Html(DeletePostTemplate {
        username: Some(user.username),
        post_id: id,
        title: post.title,
    }))
}

async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    load_modifiable(&state, id, &user)?;
    {
        let conn = state.db.get()?;
        posts::delete(&conn, id)?;
    }
    Ok(Redirect::to("/").into_response())
}

/// POST /like/{id}: like or unlike, then return to the post.
async fn like_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    {
        let mut conn = state.db.get()?;
        likes::toggle_like(&mut conn, id, &user.id)?;
    }
    Ok(Redirect::to(&format!("/article/{}", id)).into_response())
}

// --- Helpers ---

/// Load a post the user may edit or delete: 404 if missing, 403 if it belongs
/// to someone else.
fn load_modifiable(state: &AppState, id: i64, user: &CurrentUser) -> AppResult<Post> {
    let conn = state.db.get()?;
    let post = posts::get(&conn, id)?;
    if !can_modify(&post, user) {
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

/// The category menu as select options, keeping the submitted value selected.
fn category_choices(state: &AppState, selected: &str) -> AppResult<Vec<CategoryChoice>> {
    let conn = state.db.get()?;
    Ok(categories::list_all(&conn)?
        .into_iter()
        .map(|category| CategoryChoice {
            selected: category.name == selected,
            name: category.name,
        })
        .collect())
}
