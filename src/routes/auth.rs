use axum::routing::{get, post};
use axum::Router;

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/members/register/",
            get(handlers::register_page).post(handlers::register),
        )
        .route(
            "/members/login/",
            get(handlers::login_page).post(handlers::login),
        )
        .route("/members/logout/", post(handlers::logout))
        .route(
            "/members/edit_profile/",
            get(handlers::edit_profile_page).post(handlers::edit_profile),
        )
        .route(
            "/members/password/",
            get(handlers::change_password_page).post(handlers::change_password),
        )
}
