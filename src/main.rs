use devblog::{
    AppState,
    auth::SessionStore,
    config::{AppConfig, Env},
    create_router,
    notify::{NotificationQueue, notifier_from_config},
    render::Renderer,
    repository::{RepositoryState, SqliteRepository},
    seed,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, storage, seeding and the HTTP server, in that
/// order. Any failure before the server is listening aborts the process.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "devblog=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Article Store (SQLite)
    let sqlite = SqliteRepository::connect(&config.db_path)
        .await
        .expect("FATAL: Failed to open the SQLite store. Check DATABASE_PATH.");
    let repo = Arc::new(sqlite) as RepositoryState;
    tracing::info!("Article store opened at {}", config.db_path);

    // 4. Seeding
    seed::seed_admin(repo.as_ref(), &config)
        .await
        .expect("FATAL: Failed to seed the admin user.");
    seed::seed_demo_articles(repo.as_ref(), config.seed_demo_articles)
        .await
        .expect("FATAL: Failed to seed demo articles.");

    // 5. Services
    let renderer = Renderer::new(&config.template_dir, config.live_reload)
        .expect("FATAL: Failed to compile templates.");
    let sessions = SessionStore::new(&config);
    let notifier = NotificationQueue::spawn(notifier_from_config(&config));

    // 6. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        sessions,
        renderer,
        notifier,
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);

    // Connect info feeds the client address into login notifications.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("FATAL: HTTP server terminated unexpectedly.");
}
