use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use dotenvy::dotenv;
use eduzas::eduzas_config::ServerConfig;
use eduzas::eduzas_db::{init_db_pool, run_migrations};
use eduzas::logging::{init_tracing, shutdown_tracer};
use eduzas::metrics::{init_metrics, metrics_app};
use eduzas::router::init_router;
use eduzas::state::AppState;
use tracing::{error, info};

const RATE_LIMIT_SWEEP: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let server_config = ServerConfig::from_env();
    init_tracing(&server_config.log_dir)?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = init_db_pool(&database_url, server_config.database_max_connections)
        .await
        .context("failed to connect to database")?;
    run_migrations(&db)
        .await
        .context("failed to run migrations")?;

    let state = AppState::from_env(db);

    if let Some(handle) = init_metrics()? {
        let address = server_config.metrics_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind metrics listener on {address}"))?;
        info!(%address, "Metrics endpoint listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let limiters = state.rate_limiters.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP);
        loop {
            interval.tick().await;
            limiters.retain_recent();
        }
    });

    let app = init_router(state);
    let address = server_config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    info!(%address, "Server running");
    info!("Swagger UI available at http://{address}/swagger-ui");
    info!("Scalar UI available at http://{address}/scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    shutdown_tracer();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
