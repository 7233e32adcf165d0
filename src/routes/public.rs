use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only pages reachable without a session. Handlers still look at the session
/// (as `Option<AuthUser>`) to show the admin links in the navigation.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET / and /page/{page}
        // The Programming feed. Bad page tokens mean page 1; pages past the end clamp.
        .route("/", get(handlers::index))
        .route("/page/{page}", get(handlers::index_page))
        // GET /other and /other/page/{page}
        .route("/other", get(handlers::other))
        .route("/other/page/{page}", get(handlers::other_page))
        // GET /all
        // Every article in two columns.
        .route("/all", get(handlers::all_articles))
        // GET /{slug}
        // Static paths above take priority over this catch-all.
        .route("/{slug}", get(handlers::view_article))
}
