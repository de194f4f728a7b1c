use anyhow::{Context, Result};
use purge::{
    config::Config,
    database, identity, s3,
    services::{
        orchestrator::{DeletionOrchestrator, OrchestratorSettings},
        record_cleaner::PgTableStore,
        storage_cleaner::S3ObjectStore,
    },
    AppState,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let targets = config
        .cleanup_targets()
        .context("Invalid cleanup targets")?;

    let http_client = identity::build_http_client(config.identity_timeout())
        .context("Failed to build HTTP client")?;
    let identity_provider = Arc::new(identity::HttpIdentityProvider::new(
        http_client,
        &config.identity_url,
        config.identity_anon_key.clone(),
        config.identity_service_key.clone(),
    ));

    let s3_client = s3::create_client(
        &config.s3_url,
        &config.s3_access_key,
        &config.s3_secret_key,
        &config.s3_region,
    )
    .await;

    let database_url = config.database_url.clone();
    let db_pool = tokio::task::spawn_blocking(move || database::create_pool(&database_url))
        .await
        .context("Database pool task did not complete")??;

    let orchestrator = DeletionOrchestrator::from_capabilities(
        identity_provider,
        Arc::new(S3ObjectStore::new(s3_client)),
        Arc::new(PgTableStore::new(db_pool, config.owner_column.clone())),
        targets,
        OrchestratorSettings::from(&config),
    );
    info!(
        targets = ?orchestrator
            .targets()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        "Deletion workflow configured"
    );

    let app = purge::app(AppState::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(&config.address)
        .await
        .with_context(|| format!("Failed to bind {}", config.address))?;
    info!(address = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutting down");
}
