use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;

use crate::config::AppConfig;
use crate::database;
use crate::routes;
use crate::services::OrderSweeper;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "bookstore-api")]
#[command(about = "Online bookstore backend: catalog, orders and payments")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Apply migrations, start the order sweeper and serve HTTP (default)")]
    Serve,

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Cancel expired pending orders once and exit")]
    Sweep,
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    tracing::info!(
        environment = ?config.environment,
        database = %config.database.redacted_url(),
        "starting bookstore-api"
    );

    let pool = database::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => {
            database::migrate(&pool).await.context("migration failed")?;
            tracing::info!("migrations applied");
        }
        Commands::Sweep => {
            let sweeper = OrderSweeper::new(pool, &config.orders);
            let cancelled = sweeper.sweep_once().await.context("sweep failed")?;
            tracing::info!(cancelled, "sweep finished");
        }
        Commands::Serve => serve(config, pool).await?,
    }
    Ok(())
}

async fn serve(config: AppConfig, pool: sqlx::PgPool) -> anyhow::Result<()> {
    database::migrate(&pool).await.context("migration failed")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = OrderSweeper::new(pool.clone(), &config.orders).spawn(shutdown_rx);

    let bind_addr = format!("0.0.0.0:{}", config.web.port);
    let state = AppState::new(config, pool).context("failed to build application state")?;
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("bookstore-api listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        tracing::error!(error = %e, "order sweeper task failed");
    }
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
