use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};

use crate::blog::forms::CategoryForm;
use crate::blog::slug::display_label;
use crate::blog::{categories, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::forms::FieldErrors;
use crate::routes::home::{category_menu, Html, MenuItem, PostCard};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "categories.html")]
pub struct CategoryPostsTemplate {
    pub username: Option<String>,
    pub cats: String,
    pub category_posts: Vec<PostCard>,
}

#[derive(Template)]
#[template(path = "category_list.html")]
pub struct CategoryListTemplate {
    pub username: Option<String>,
    pub is_admin: bool,
    pub cat_menu_list: Vec<MenuItem>,
}

#[derive(Template)]
#[template(path = "add_category.html")]
pub struct AddCategoryTemplate {
    pub username: Option<String>,
    pub form: CategoryForm,
    pub errors: FieldErrors,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/category/{slug}/", get(category_posts))
        .route("/category-list/", get(category_list))
        .route("/category-list/{id}/remove", post(remove_category))
        .route("/add_category/", get(add_category_page).post(add_category))
}

/// GET /category/{slug}/: posts tagged with the category the slug names.
async fn category_posts(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(slug): Path<String>,
) -> AppResult<Html<CategoryPostsTemplate>> {
    let found = {
        let conn = state.db.get()?;
        posts::list_by_category_slug(&conn, &slug)?
    };

    let category_posts = found
        .into_iter()
        .map(|post| PostCard::new(post, maybe_user.0.as_ref()))
        .collect();

    Ok(Html(CategoryPostsTemplate {
        username: maybe_user.username(),
        cats: display_label(&slug),
        category_posts,
    }))
}

async fn category_list(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
) -> AppResult<Html<CategoryListTemplate>> {
    let cat_menu_list = {
        let conn = state.db.get()?;
        category_menu(&conn)?
    };
    Ok(Html(CategoryListTemplate {
        username: maybe_user.username(),
        is_admin: maybe_user.0.as_ref().is_some_and(|user| user.is_admin),
        cat_menu_list,
    }))
}

async fn add_category_page(user: CurrentUser) -> Html<AddCategoryTemplate> {
    Html(AddCategoryTemplate {
        username: Some(user.username),
        form: CategoryForm::default(),
        errors: FieldErrors::default(),
    })
}

async fn add_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<CategoryForm>,
) -> AppResult<Response> {
    let name = match form.clean() {
        Ok(name) => name,
        Err(errors) => {
            let page = AddCategoryTemplate {
                username: Some(user.username),
                form,
                errors,
            };
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response());
        }
    };

    {
        let conn = state.db.get()?;
        categories::create(&conn, &name)?;
    }
    Ok(Redirect::to("/").into_response())
}

/// POST /category-list/{id}/remove: admins only. Posts filed under the name
/// keep their `category_title`.
async fn remove_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }
    {
        let conn = state.db.get()?;
        let category = categories::get(&conn, id)?;
        categories::delete(&conn, category.id)?;
        tracing::info!(name = %category.name, by = %user.username, "category removed");
    }
    Ok(Redirect::to("/category-list/").into_response())
}
