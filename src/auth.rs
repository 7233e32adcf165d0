use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, RwLock},
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    models::SessionData,
    repository::RepositoryState,
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "user";

// --- Password Hashing ---

// Argon2id, 19 MiB, 2 iterations, 1 lane.
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password")]
    Hash,
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_ITERATIONS, ARGON2_PARALLELISM, None)
        .map_err(|_| PasswordError::Hash)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// hash_password
///
/// Produces a salted PHC string suitable for storing in `users.password_hash`.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::Hash)
}

/// verify_password
///
/// Constant-time comparison of `password` against a stored PHC string. A malformed
/// stored hash never verifies.
pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::error!("stored password hash is not a valid PHC string");
        return false;
    };
    hasher()
        .map(|a| a.verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// Well-formed hash with the same cost as real ones. Checked when the username is
/// unknown so both failure paths take the same time; no password matches it.
pub const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// verify_credentials
///
/// Password check for a login: `stored_hash` is `None` when the user does not exist,
/// in which case a full verification still runs and the result is always false.
pub fn verify_credentials(stored_hash: Option<&str>, password: &str) -> bool {
    match stored_hash {
        Some(hash) => verify_password(hash, password),
        None => {
            let _ = verify_password(UNKNOWN_USER_HASH, password);
            false
        }
    }
}

// --- Sessions ---

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session token rejected: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("session has been revoked")]
    Revoked,
    #[error("session cookie is not a valid header value")]
    InvalidHeader,
}

/// Claims
///
/// Payload of the signed session token. `jti` identifies the session so logout can
/// revoke it before `exp`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub name: String,
    pub authenticated: bool,
    pub jti: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// Per-session settings applied at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOption {
    /// Cookie lifetime in seconds. Zero or negative expires the session immediately.
    MaxAge(i64),
}

/// Session
///
/// A session loaded from (or about to be written to) the request cookie.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    data: SessionData,
    max_age: Option<i64>,
    // `exp` of the token this session was read from. None for sessions never issued.
    issued_until: Option<i64>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            data: SessionData::default(),
            max_age: None,
            issued_until: None,
        }
    }
}

impl Session {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// SessionStore
///
/// Cookie-backed session backend. The cookie holds an HS256 token signed with the
/// configured secret; the only server-side state is the revoked session ids, each kept
/// until its token would have expired anyway.
#[derive(Clone)]
pub struct SessionStore {
    secret: String,
    max_age: i64,
    secure: bool,
    revoked: Arc<RwLock<HashMap<Uuid, i64>>>,
}

impl SessionStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            secret: config.session_secret.clone(),
            max_age: config.session_max_age,
            secure: config.env == Env::Production,
            revoked: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// get
    ///
    /// Loads the session named `cookie_name` from the request headers. A missing cookie
    /// yields a fresh anonymous session; a tampered, expired or revoked token is an error,
    /// which callers treat as anonymous.
    pub fn get(&self, headers: &HeaderMap, cookie_name: &str) -> Result<Session, SessionError> {
        let Some(token) = find_cookie(headers, cookie_name) else {
            return Ok(Session::default());
        };

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // Revocations are pruned at `exp`, so no grace period past it.
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &decoding_key, &validation)?.claims;

        if self.is_revoked(&claims.jti) {
            return Err(SessionError::Revoked);
        }

        Ok(Session {
            id: claims.jti,
            data: SessionData {
                name: claims.name,
                authenticated: claims.authenticated,
            },
            max_age: None,
            issued_until: Some(claims.exp as i64),
        })
    }

    pub fn set(&self, session: &mut Session, data: SessionData) {
        session.data = data;
    }

    pub fn read_state(&self, session: &Session) -> SessionData {
        session.data.clone()
    }

    pub fn set_option(&self, session: &mut Session, option: SessionOption) {
        match option {
            SessionOption::MaxAge(seconds) => session.max_age = Some(seconds),
        }
    }

    /// save
    ///
    /// Serializes `session` into a `Set-Cookie` header value. Saving a session whose
    /// max-age is not positive emits an already-expired cookie and, if the session was
    /// read from a valid token, revokes that token.
    pub fn save(&self, session: &Session, cookie_name: &str) -> Result<HeaderValue, SessionError> {
        let max_age = session.max_age.unwrap_or(self.max_age);

        if max_age <= 0 {
            if let Some(exp) = session.issued_until {
                self.revoke(session.id, exp);
            }
            return self.cookie_header(cookie_name, "", 0);
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            name: session.data.name.clone(),
            authenticated: session.data.authenticated,
            jti: session.id,
            iat: now as usize,
            exp: (now + max_age) as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        self.cookie_header(cookie_name, &token, max_age)
    }

    fn cookie_header(&self, name: &str, value: &str, max_age: i64) -> Result<HeaderValue, SessionError> {
        let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).map_err(|_| SessionError::InvalidHeader)
    }

    /// Number of revocations still being tracked.
    pub fn revoked_count(&self) -> usize {
        self.revoked
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn revoke(&self, id: Uuid, exp: i64) {
        let now = Utc::now().timestamp();
        let mut revoked = self
            .revoked
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Expired tokens are rejected by `decode` already.
        revoked.retain(|_, until| *until >= now);
        if exp >= now {
            revoked.insert(id, exp);
        }
    }

    fn is_revoked(&self, id: &Uuid) -> bool {
        self.revoked
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(id)
    }
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

// --- Extractors ---

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub name: String,
}

impl AuthUser {
    /// Resolves the session cookie to an authenticated, still-existing user.
    async fn resolve<S>(parts: &Parts, state: &S) -> Option<Self>
    where
        S: Send + Sync,
        RepositoryState: FromRef<S>,
        SessionStore: FromRef<S>,
    {
        let sessions = SessionStore::from_ref(state);
        let repo = RepositoryState::from_ref(state);

        let session = match sessions.get(&parts.headers, SESSION_COOKIE) {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!("ignoring session cookie: {}", e);
                return None;
            }
        };

        let data = sessions.read_state(&session);
        if !data.authenticated {
            return None;
        }

        // The account may have been removed after the cookie was issued.
        let user = repo.get_user(&data.name).await?;
        Some(AuthUser { name: user.username })
    }
}

/// AuthUser Extractor Implementation
///
/// Gate for the admin-only routes: any request without a valid, authenticated session
/// is rejected with 401 before the handler runs.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionStore: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Self::resolve(parts, state)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Lets public pages take `Option<AuthUser>` to adapt their navigation.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    SessionStore: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(Self::resolve(parts, state).await)
    }
}

/// ClientIp
///
/// Best-effort client address: the first `X-Forwarded-For` hop when behind a proxy,
/// otherwise the socket peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        if let Some(ip) = forwarded {
            return Ok(ClientIp(ip.to_string()));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ClientIp(peer))
    }
}
