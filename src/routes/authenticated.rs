use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Everything that changes content. `create_router` wraps this router in the
/// authentication layer, so anonymous requests are answered with 401 before any
/// handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/POST /new
        .route(
            "/new",
            get(handlers::new_article_form).post(handlers::create_article),
        )
        // GET/POST /{slug}/edit
        // The slug may change; the redirect follows the new one.
        .route(
            "/{slug}/edit",
            get(handlers::edit_article_form).post(handlers::update_article),
        )
        // GET /{slug}/delete
        .route("/{slug}/delete", get(handlers::delete_article))
        // GET /admin
        .route("/admin", get(handlers::admin_panel))
}
