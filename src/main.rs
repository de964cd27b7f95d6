use anyhow::Result;
use std::net::SocketAddr;
use gym_manager::api::create_routes;
use gym_manager::auth::AuthService;
use gym_manager::config::{run_migrations, AppConfig, DatabaseConfig};
use gym_manager::services::MaintenanceService;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.log_level))),
        )
        .with(fmt::layer())
        .init();

    let db_config = DatabaseConfig::from_env()?;
    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;
    info!("database ready");

    let mut maintenance =
        MaintenanceService::new(AuthService::new(pool.clone(), &config.jwt_secret)).await?;
    maintenance.start(&config.token_purge_cron).await?;

    let app = create_routes(pool, &config);

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!(environment = %config.environment, "Gym manager listening on http://{}", address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    maintenance.shutdown().await?;
    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
