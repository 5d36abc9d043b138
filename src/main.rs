use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::ExposeSecret;
use tokio::signal;
use tracing::{info, warn};

use property_listings::api::{RouterConfig, create_router_with_config};
use property_listings::app::AppState;
use property_listings::config::AppConfig;
use property_listings::infra::{PostgresClient, init_metrics_handle, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenv().ok();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format).context("Failed to initialize tracing")?;
    info!(?config, "Configuration loaded");

    let metrics = init_metrics_handle();
    if metrics.is_none() {
        warn!("Prometheus recorder unavailable, /metrics disabled");
    }

    let db = PostgresClient::new(
        config.database_url.expose_secret(),
        config.database.clone(),
    )
    .await
    .context("Failed to connect to PostgreSQL")?;

    if config.run_migrations {
        db.run_migrations()
            .await
            .context("Failed to run database migrations")?;
    }

    let db = Arc::new(db);
    let app_state = Arc::new(AppState::new(db.clone(), db).with_metrics(metrics));

    let router = create_router_with_config(
        app_state,
        RouterConfig {
            request_timeout: config.request_timeout,
        },
    );

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Server starting on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
}
