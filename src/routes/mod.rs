pub mod assets;
pub mod auth;
pub mod categories;
pub mod home;
pub mod posts;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The complete application: blog pages, member pages and static assets.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(posts::router())
        .merge(categories::router())
        .merge(auth::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
