//! Latch API server binary.
//!
//! Serves the auth API and runs the periodic session sweep that deletes
//! expired and stale-revoked session rows.

use std::net::SocketAddr;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "latch_api_server", about = "Latch API server")]
struct Args {
    /// Port to listen on (0 = ephemeral).
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/latch"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Seconds between session sweep runs.
    #[arg(long, default_value_t = 3600)]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,latch_api=debug,latch_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(database_url = %args.database_url, port = args.port, "starting latch_api_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    // Run database migrations.
    info!("running database migrations");
    latch_api::migrate(&pool).await?;

    let mut config = latch_api::config::ApiConfig::from_env();
    config.bind_addr = format!("127.0.0.1:{}", args.port);
    config.pg_connection_url = args.database_url;

    let state = latch_api::AppState::new(pool.clone(), config.clone());

    // Periodic sweep: expired sessions and revoked rows past the grace
    // window are deleted off the request path.
    let grace_days = config.auth.session_retention_grace_days;
    tokio::spawn(async move {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(args.sweep_interval_secs));
        loop {
            ticker.tick().await;
            match latch_core::auth::sessions::sweep_expired(&pool, grace_days).await {
                Ok(removed) if removed > 0 => info!(removed, "swept stale sessions"),
                Ok(_) => {}
                Err(e) => error!(error = %e, "session sweep failed"),
            }
        }
    });

    let app = latch_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, "REST API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
