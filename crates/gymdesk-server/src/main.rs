//! GymDesk Server: application entry point.

use anyhow::Context;
use clap::Parser;
use gymdesk_db::{DbManager, run_migrations};
use gymdesk_server::{AppState, Args, bootstrap, router, sweep};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("gymdesk=info".parse()?))
        .json()
        .init();

    let auth = args.auth_config()?;
    let seed = args.bootstrap()?;
    let db = DbManager::connect(&args.db_config())
        .await
        .context("connecting to SurrealDB")?;
    run_migrations(db.client())
        .await
        .context("running migrations")?;

    let mut state = AppState::new(db.client().clone(), auth);
    if let Some(max_age) = args.qr_max_age() {
        state = state.with_qr_max_age(max_age);
    }

    if let Some(seed) = &seed {
        bootstrap::ensure(&state, seed)
            .await
            .context("bootstrapping the first unit")?;
    }

    let sweeper = args
        .sweep_interval()
        .map(|interval| sweep::spawn(state.clone(), interval));

    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    info!(listen = %args.listen, "GymDesk server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("GymDesk server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
