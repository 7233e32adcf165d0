use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Session Router Module
///
/// Login and logout, nested under `/admin`. These stay outside the authentication layer:
/// they are how a visitor gets in and out of a session.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /admin/login
        // GET redirects to the panel when a session already exists.
        .route("/login", get(handlers::login_page).post(handlers::login))
        // POST /admin/logout
        .route("/logout", post(handlers::logout))
}
