use placeme_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{S3StorageClient, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const BIND_ADDR: &str = "0.0.0.0:3000";

/// init_tracing
///
/// Wires the subscriber for the whole process. Local runs get the pretty
/// human-readable layer; production emits one JSON object per event for the log
/// aggregator. `RUST_LOG` overrides the default filter either way.
fn init_tracing(env: &Env) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "placeme_portal=debug,tower_http=info,axum=trace".into());

    match env {
        Env::Local => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        Env::Production => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() {
    // Configuration first: AppConfig::load is fail-fast, so a misconfigured
    // production deploy dies here instead of serving with missing secrets.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    init_tracing(&config.env);
    tracing::info!("starting placement portal in {:?} mode", config.env);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // A fresh MinIO container has no buckets; provision the resume bucket so the
    // upload pipeline works on first run. Production buckets already exist.
    if config.env == Env::Local {
        use placeme_portal::storage::StorageService;
        s3_client.ensure_bucket().await;
    }
    let storage = Arc::new(s3_client) as StorageState;

    let app = create_router(AppState {
        repo,
        storage,
        config,
    });

    let listener = TcpListener::bind(BIND_ADDR).await.unwrap();
    tracing::info!("listening on {BIND_ADDR}");
    tracing::info!("Swagger UI at http://localhost:3000/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
