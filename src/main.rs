use rusqlite::Connection;
use std::sync::Arc;
use stocksim_web::config::{level_from_arg, Config};
use stocksim_web::finnhub::FinnhubClient;
use stocksim_web::{build_router, AppState, DatabasePool};
use time::Duration;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_rusqlite_store::RusqliteStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initalize dotenv so we can read .env file
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // The first argument, if any, overrides the configured log level
    let log_level = std::env::args()
        .nth(1)
        .map(|arg| level_from_arg(&arg))
        .unwrap_or(config.log_level);

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .with_max_level(log_level)
        .init();

    tracing::info!("Log level set to: {}", log_level);

    // Initialize our session store as a SQLite database
    let conn = Connection::open(&config.session_db_path)?;
    let session_store = RusqliteStore::new(conn.into());
    session_store.migrate().await?;

    // Start a task to delete expired sessions every minute
    let deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    // Create session layer with some configuration
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::days(
            config.session_inactivity_days,
        )))
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/");

    // Initialize database pool and quote source
    let pool = DatabasePool::open(&config.database_path)?;
    let quotes = FinnhubClient::new(
        config.finnhub_api_key.clone(),
        config.finnhub_base_url.clone(),
        config.quote_cache_ttl,
    );
    let state = AppState {
        pool,
        quotes: Arc::new(quotes),
    };

    // Build application with routes
    let app = build_router(state).layer(session_layer);

    // Run server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("Listening on: {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    deletion_task.await??;

    Ok(())
}
