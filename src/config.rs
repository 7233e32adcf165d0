use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// shared immutably with every request through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and cookie hardening.
    pub env: Env,
    // Path of the SQLite file backing the article store.
    pub db_path: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Secret used to sign session cookies.
    pub session_secret: String,
    // Lifetime of an issued session cookie, in seconds.
    pub session_max_age: i64,
    // Directory the renderer reads templates from when live reload is enabled.
    pub template_dir: String,
    // Recompile templates on every render instead of caching them.
    pub live_reload: bool,
    // Seed credentials for the single admin account.
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
    // Optional endpoint receiving login attempt notices.
    pub notify_webhook_url: Option<String>,
    // Demo articles per category inserted into an empty store.
    pub seed_demo_articles: usize,
}

/// Env
///
/// Defines the runtime context, used to switch between developer conveniences
/// (pretty logs, insecure cookies, fallback secrets) and hardened production settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_SESSION_SECRET: &str = "local-development-session-secret-value";
const DEFAULT_SESSION_MAX_AGE: i64 = 720;

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_path: "devblog.db".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            session_max_age: DEFAULT_SESSION_MAX_AGE,
            template_dir: "templates".to_string(),
            live_reload: false,
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "password".to_string(),
            notify_webhook_url: None,
            seed_demo_articles: 0,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads every parameter from environment variables and implements the
    /// **fail-fast** principle.
    ///
    /// # Panics
    /// Panics if a variable required in production (`SESSION_SECRET`, `ADMIN_PASSWORD`)
    /// is missing, so the server never starts with a guessable secret.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let defaults = Self::default();

        let (session_secret, admin_password) = match env {
            Env::Production => (
                env::var("SESSION_SECRET")
                    .expect("FATAL: SESSION_SECRET must be set in production."),
                env::var("ADMIN_PASSWORD")
                    .expect("FATAL: ADMIN_PASSWORD must be set in production."),
            ),
            Env::Local => (
                env::var("SESSION_SECRET").unwrap_or(defaults.session_secret),
                env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            ),
        };

        let session_max_age = env::var("SESSION_MAX_AGE")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_SESSION_MAX_AGE);

        let live_reload = env::var("LIVE_RELOAD")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let seed_demo_articles = env::var("SEED_DEMO_ARTICLES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        Self {
            env,
            db_path: env::var("DATABASE_PATH").unwrap_or(defaults.db_path),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_secret,
            session_max_age,
            template_dir: env::var("TEMPLATE_DIR").unwrap_or(defaults.template_dir),
            live_reload,
            admin_username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            admin_password,
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            seed_demo_articles,
        }
    }
}
