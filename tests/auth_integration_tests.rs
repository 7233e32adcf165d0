mod common;

use argon2::PasswordHash;
use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    routing,
};
use chrono::Utc;
use common::{ADMIN, body_string, get, memory_repo, session_cookie, test_router, test_state};
use devblog::{
    AppConfig, SessionStore,
    auth::{
        Claims, ClientIp, SESSION_COOKIE, Session, SessionError, SessionOption,
        UNKNOWN_USER_HASH, hash_password, verify_credentials, verify_password,
    },
    config::Env,
    models::SessionData,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::net::SocketAddr;
use tower::ServiceExt;
use uuid::Uuid;

fn headers_with_cookie(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    headers
}

fn saved_pair(store: &SessionStore, session: &Session) -> String {
    let header = store.save(session, SESSION_COOKIE).unwrap();
    common::cookie_pair(header.to_str().unwrap())
}

// --- Password Hashing ---

#[test]
fn test_password_hash_round_trip() {
    let hash = hash_password("correct horse").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(verify_password(&hash, "correct horse"));
    assert!(!verify_password(&hash, "battery staple"));
}

#[test]
fn test_hashes_are_salted() {
    let a = hash_password("same").unwrap();
    let b = hash_password("same").unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_malformed_hash_never_verifies() {
    assert!(!verify_password("not-a-phc-string", "anything"));
    assert!(!verify_password("", ""));
}

#[test]
fn test_unknown_user_hash_costs_the_same_as_a_real_one() {
    let real = hash_password("hunter22").unwrap();
    let real = PasswordHash::new(&real).unwrap();
    let dummy = PasswordHash::new(UNKNOWN_USER_HASH).unwrap();

    assert_eq!(dummy.algorithm, real.algorithm);
    assert_eq!(dummy.version, real.version);
    assert_eq!(dummy.params.to_string(), real.params.to_string());
}

#[test]
fn test_verify_credentials() {
    let hash = hash_password("hunter22").unwrap();

    assert!(verify_credentials(Some(&hash), "hunter22"));
    assert!(!verify_credentials(Some(&hash), "hunter23"));
    assert!(!verify_credentials(None, "hunter22"));
    assert!(!verify_credentials(None, ""));
}

// --- Session Store ---

#[test]
fn test_missing_cookie_is_anonymous() {
    let store = SessionStore::new(&AppConfig::default());
    let session = store.get(&HeaderMap::new(), SESSION_COOKIE).unwrap();
    assert_eq!(store.read_state(&session), SessionData::default());
}

#[test]
fn test_saved_session_reads_back() {
    let store = SessionStore::new(&AppConfig::default());
    let mut session = Session::default();
    let data = SessionData {
        name: ADMIN.to_string(),
        authenticated: true,
    };
    store.set(&mut session, data.clone());

    let pair = saved_pair(&store, &session);
    let loaded = store
        .get(&headers_with_cookie(&format!("theme=dark; {pair}")), SESSION_COOKIE)
        .unwrap();

    assert_eq!(store.read_state(&loaded), data);
    assert_eq!(loaded.id(), session.id());
}

#[test]
fn test_cookie_attributes() {
    let store = SessionStore::new(&AppConfig::default());
    let header = store.save(&Session::default(), SESSION_COOKIE).unwrap();
    let value = header.to_str().unwrap();

    assert!(value.starts_with("user="));
    assert!(value.contains("HttpOnly"));
    assert!(value.contains("Path=/"));
    assert!(value.contains("Max-Age=720"));
    assert!(!value.contains("Secure"));

    let production = SessionStore::new(&AppConfig {
        env: Env::Production,
        ..AppConfig::default()
    });
    let header = production.save(&Session::default(), SESSION_COOKIE).unwrap();
    assert!(header.to_str().unwrap().contains("Secure"));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let other = SessionStore::new(&AppConfig {
        session_secret: "a-completely-different-secret".to_string(),
        ..AppConfig::default()
    });
    let store = SessionStore::new(&AppConfig::default());

    let pair = saved_pair(&other, &Session::default());
    let result = store.get(&headers_with_cookie(&pair), SESSION_COOKIE);
    assert!(matches!(result, Err(SessionError::InvalidToken(_))));
}

#[test]
fn test_expired_token_is_rejected() {
    let config = AppConfig::default();
    let store = SessionStore::new(&config);

    let now = Utc::now().timestamp() as usize;
    let claims = Claims {
        name: ADMIN.to_string(),
        authenticated: true,
        jti: Uuid::new_v4(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .unwrap();

    let result = store.get(&headers_with_cookie(&format!("user={token}")), SESSION_COOKIE);
    assert!(matches!(result, Err(SessionError::InvalidToken(_))));
}

#[test]
fn test_negative_max_age_expires_and_revokes() {
    let store = SessionStore::new(&AppConfig::default());
    let mut session = Session::default();
    store.set(
        &mut session,
        SessionData {
            name: ADMIN.to_string(),
            authenticated: true,
        },
    );
    let live_pair = saved_pair(&store, &session);

    let mut loaded = store
        .get(&headers_with_cookie(&live_pair), SESSION_COOKIE)
        .unwrap();
    store.set_option(&mut loaded, SessionOption::MaxAge(-1));
    let expired = store.save(&loaded, SESSION_COOKIE).unwrap();
    let expired = expired.to_str().unwrap();
    assert!(expired.starts_with("user=;"));
    assert!(expired.contains("Max-Age=0"));
    assert_eq!(store.revoked_count(), 1);

    // The old cookie value no longer opens a session.
    let result = store.get(&headers_with_cookie(&live_pair), SESSION_COOKIE);
    assert!(matches!(result, Err(SessionError::Revoked)));
}

#[test]
fn test_expiring_a_session_without_token_tracks_nothing() {
    let store = SessionStore::new(&AppConfig::default());

    for _ in 0..1000 {
        let mut session = store.get(&HeaderMap::new(), SESSION_COOKIE).unwrap();
        store.set_option(&mut session, SessionOption::MaxAge(-1));
        let header = store.save(&session, SESSION_COOKIE).unwrap();
        assert!(header.to_str().unwrap().contains("Max-Age=0"));
    }

    assert_eq!(store.revoked_count(), 0);
}

#[test]
fn test_revocations_are_dropped_once_their_token_expires() {
    let store = SessionStore::new(&AppConfig::default());

    let mut short_lived = Session::default();
    store.set_option(&mut short_lived, SessionOption::MaxAge(1));
    let pair = saved_pair(&store, &short_lived);
    let mut loaded = store.get(&headers_with_cookie(&pair), SESSION_COOKIE).unwrap();
    store.set_option(&mut loaded, SessionOption::MaxAge(-1));
    store.save(&loaded, SESSION_COOKIE).unwrap();
    assert_eq!(store.revoked_count(), 1);

    std::thread::sleep(std::time::Duration::from_millis(2100));

    // The expired token is refused on its own merits.
    let result = store.get(&headers_with_cookie(&pair), SESSION_COOKIE);
    assert!(matches!(result, Err(SessionError::InvalidToken(_))));

    let pair = saved_pair(&store, &Session::default());
    let mut loaded = store.get(&headers_with_cookie(&pair), SESSION_COOKIE).unwrap();
    store.set_option(&mut loaded, SessionOption::MaxAge(-1));
    store.save(&loaded, SESSION_COOKIE).unwrap();
    assert_eq!(store.revoked_count(), 1);
}

// --- Extractors ---

#[tokio::test]
async fn test_gate_requires_existing_user() {
    let state = test_state(memory_repo(vec![]).await);
    let app = test_router(&state);

    let ghost = session_cookie(&state, "ghost");
    let response = app.clone().oneshot(get("/admin", Some(&ghost))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let admin = session_cookie(&state, ADMIN);
    let response = app.oneshot(get("/admin", Some(&admin))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unauthenticated_session_does_not_pass_gate() {
    let state = test_state(memory_repo(vec![]).await);
    let mut session = Session::default();
    state.sessions.set(
        &mut session,
        SessionData {
            name: ADMIN.to_string(),
            authenticated: false,
        },
    );
    let pair = saved_pair(&state.sessions, &session);

    let response = test_router(&state)
        .oneshot(get("/new", Some(&pair)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

async fn echo_ip(ClientIp(ip): ClientIp) -> String {
    ip
}

#[tokio::test]
async fn test_client_ip_prefers_forwarded_header() {
    let app = Router::new().route("/ip", routing::get(echo_ip));

    let request = Request::builder()
        .uri("/ip")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(body_string(response).await, "203.0.113.7");

    let mut request = Request::builder().uri("/ip").body(Body::empty()).unwrap();
    let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(body_string(response).await, "192.0.2.10");

    let request = Request::builder().uri("/ip").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(body_string(response).await, "unknown");
}
