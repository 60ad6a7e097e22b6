//! Retention and legal-hold engine for employee documents.

mod config;
mod db;
mod jobs;
mod models;
mod routes;
mod services;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use clap::Parser;
use tokio_util::task::TaskTracker;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::{CustodianConfig, LogFormat, LoggingConfig},
    db::DbPool,
    services::Services,
};

#[derive(Parser, Debug)]
#[command(version, about = "Custodian document retention engine", long_about = None)]
struct Args {
    /// Path to config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<String>,
}

fn init_tracing(config: &LoggingConfig) {
    let filter = build_env_filter(config);
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

/// Build the environment filter from logging config. `RUST_LOG` wins over
/// the config file.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let base_level = config.level.to_tracing_level().to_string().to_lowercase();

    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new(&base_level))
    } else if let Some(filter) = &config.filter {
        let combined = format!("{},{}", base_level, filter);
        EnvFilter::try_new(combined).unwrap_or_else(|_| EnvFilter::new(&base_level))
    } else {
        EnvFilter::new(format!("{},hyper=warn,tower=info,sqlx=warn", base_level))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CustodianConfig::from_file(path)?,
        None => CustodianConfig::default(),
    };

    init_tracing(&config.observability.logging);

    let db = Arc::new(DbPool::from_config(&config.database).await?);
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    let file_storage = services::build_file_storage(&config.storage)?;
    let services = Services::new(db, file_storage);

    let task_tracker = TaskTracker::new();
    {
        let services = services.clone();
        let sweep_config = config.jobs.sweep.clone();
        task_tracker.spawn(async move {
            jobs::start_deletion_sweep_worker(services, sweep_config).await;
        });
    }
    {
        let services = services.clone();
        let repair_config = config.jobs.hold_repair.clone();
        task_tracker.spawn(async move {
            jobs::start_hold_repair_worker(services, repair_config).await;
        });
    }

    let router = routes::build_router(services, &config.server);
    let addr = config.server.bind_addr();
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(task_tracker))
        .await?;

    Ok(())
}

async fn shutdown_signal(task_tracker: TaskTracker) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    task_tracker.close();
}
