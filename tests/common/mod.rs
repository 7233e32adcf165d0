#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use devblog::{
    AppConfig, AppState, MemoryRepository, NotificationQueue, Renderer, SessionStore,
    auth::{SESSION_COOKIE, Session},
    create_router,
    models::{Article, Category, SessionData, User},
    notify::LogNotifier,
    repository::{Repository, RepositoryState},
};
use std::sync::Arc;

pub const ADMIN: &str = "admin";

/// A fixed instant so dates in rendered output are predictable.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn article(slug: &str, category: Category, seconds: i64) -> Article {
    let at = base_time() + Duration::seconds(seconds);
    Article {
        title: format!("Title {slug}"),
        preview: format!("Preview of {slug}"),
        body: format!("<p>Body of {slug}</p>"),
        slug: slug.to_string(),
        published: at,
        edited: at,
        category,
    }
}

/// `count` articles of `category`, one second apart, oldest first.
pub fn articles(prefix: &str, category: Category, count: usize) -> Vec<Article> {
    (0..count)
        .map(|i| article(&format!("{prefix}-{i}"), category, i as i64))
        .collect()
}

/// A memory store holding `articles` and the admin user. The admin's password hash is
/// a placeholder; tests that log in for real use `admin_with_password`.
pub async fn memory_repo(articles: Vec<Article>) -> Arc<MemoryRepository> {
    let repo = MemoryRepository::with_articles(articles).await;
    repo.create_user(User {
        username: ADMIN.to_string(),
        email: "admin@example.com".to_string(),
        password_hash: "not-a-phc-string".to_string(),
        ..Default::default()
    })
    .await
    .unwrap();
    Arc::new(repo)
}

pub fn test_state(repo: RepositoryState) -> AppState {
    let config = AppConfig::default();
    AppState {
        repo,
        sessions: SessionStore::new(&config),
        renderer: Renderer::new(&config.template_dir, false).unwrap(),
        notifier: NotificationQueue::spawn(Arc::new(LogNotifier)),
        config,
    }
}

pub fn test_router(state: &AppState) -> Router {
    create_router(state.clone())
}

/// `name=value` pair of a freshly issued authenticated session for `username`.
pub fn session_cookie(state: &AppState, username: &str) -> String {
    let mut session = Session::default();
    state.sessions.set(
        &mut session,
        SessionData {
            name: username.to_string(),
            authenticated: true,
        },
    );
    let header = state.sessions.save(&session, SESSION_COOKIE).unwrap();
    cookie_pair(header.to_str().unwrap())
}

/// Strips the attributes off a `Set-Cookie` value.
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
