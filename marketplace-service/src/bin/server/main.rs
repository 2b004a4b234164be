use std::sync::Arc;

use auth::Authenticator;
use auth::PasswordHasher;
use marketplace_service::config::Config;
use marketplace_service::identity::accounts::AccountService;
use marketplace_service::identity::bootstrap::ensure_admin_with_retry;
use marketplace_service::identity::password_reset::PasswordResetService;
use marketplace_service::identity::service::AuthenticationService;
use marketplace_service::inbound::http::router::create_router;
use marketplace_service::inbound::http::router::AppState;
use marketplace_service::outbound::notifications::LoggingResetNotifier;
use marketplace_service::outbound::repositories::PostgresPrincipalStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketplace_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "marketplace-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        token_ttl_hours = config.jwt.expiration_hours,
        store_timeout_secs = config.store.timeout_secs,
        reset_ttl_hours = config.reset.ttl_hours,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let hasher = PasswordHasher::with_cost(
        config.password.memory_cost_kib,
        config.password.iterations,
        config.password.parallelism,
    )?;
    let authenticator = Arc::new(Authenticator::with_hasher(
        config.jwt.secret.as_bytes(),
        hasher,
    ));
    let store = Arc::new(PostgresPrincipalStore::new(
        pg_pool,
        config.store.timeout(),
    ));

    // Startup aborts when the admin cannot be ensured
    let outcome = ensure_admin_with_retry(
        store.as_ref(),
        &authenticator,
        &config.admin.identifier,
        &config.admin.default_password,
        config.admin.bootstrap_attempts,
        config.admin.bootstrap_backoff(),
    )
    .await?;
    tracing::info!(outcome = ?outcome, "Admin bootstrap completed");

    let state = AppState {
        authentication: Arc::new(AuthenticationService::new(
            Arc::clone(&store),
            Arc::clone(&authenticator),
            chrono::Duration::hours(config.jwt.expiration_hours),
            config.admin.identifier.clone(),
        )),
        password_reset: Arc::new(PasswordResetService::new(
            Arc::clone(&store),
            Arc::new(LoggingResetNotifier::new()),
            Arc::clone(&authenticator),
            chrono::Duration::hours(config.reset.ttl_hours),
        )),
        accounts: Arc::new(AccountService::new(Arc::clone(&store))),
        authenticator,
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, create_router(state)).await?;

    tracing::info!("Server exited");

    Ok(())
}
