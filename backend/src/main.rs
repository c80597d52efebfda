//! shelter-ops server entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use shelter_ops_backend::api::{create_router, AppState};
use shelter_ops_backend::config::Config;
use shelter_ops_backend::services::auth_service::AuthService;
use shelter_ops_backend::services::metrics_service;
use shelter_ops_backend::services::scheduler_service;
use shelter_ops_backend::services::staff_user_service::{BootstrapOutcome, StaffUserService};
use shelter_ops_backend::telemetry;

#[derive(Debug, Parser)]
#[command(name = "shelter-ops", version, about = "Shelter operations backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations, bootstrap the admin account, and serve HTTP (default).
    Serve,
    /// Apply pending database migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    telemetry::init_tracing(config.log_format);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            let db = connect(&config).await?;
            migrate(&db).await
        }
    }
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    tracing::info!("Connecting to database");
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")
}

async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("failed to run migrations")?;
    tracing::info!("Database migrations complete");
    Ok(())
}

async fn bootstrap_admin(db: &PgPool, config: &Config) -> anyhow::Result<()> {
    let auth = AuthService::new(config);
    let outcome = StaffUserService::new(db.clone(), &auth)
        .bootstrap_admin(
            config.admin_username.as_deref(),
            config.admin_password.as_deref(),
        )
        .await
        .context("failed to bootstrap admin user")?;

    match outcome {
        BootstrapOutcome::Created(username) => {
            tracing::info!(username = %username, "Bootstrap admin created")
        }
        BootstrapOutcome::NotConfigured => tracing::warn!(
            "No admin account exists and ADMIN_USERNAME/ADMIN_PASSWORD are not set"
        ),
        BootstrapOutcome::AdminExists => {}
    }
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    if config.uses_default_secret() {
        tracing::warn!("SESSION_SECRET is not set; using an insecure default");
    }

    let db = connect(&config).await?;
    migrate(&db).await?;
    bootstrap_admin(&db, &config).await?;

    let metrics = match metrics_service::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Prometheus recorder unavailable: {}", e);
            None
        }
    };

    scheduler_service::spawn_all(db.clone(), config.clone());

    let addr = config.bind_address();
    let state = Arc::new(AppState::new(config, db, metrics));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
