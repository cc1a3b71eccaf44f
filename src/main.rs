//! UniCart Storefront - apparel storefront backend

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unicart::api::{self, AppState};
use unicart::media::{LocalMediaStore, MediaStore};
use unicart::publisher::{EventPublisher, LogPublisher, NatsPublisher};
use unicart::services::Services;
use unicart::store::{MemoryStore, PgStore, Repositories};
use unicart::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let repos = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections).await?;
            store.migrate().await?;
            info!("Connected to Postgres");
            Repositories::from_store(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, data lives in memory only");
            Repositories::from_store(Arc::new(MemoryStore::new()))
        }
    };

    let publisher: Arc<dyn EventPublisher> = match &config.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => {
                info!(%url, "Publishing events to NATS");
                Arc::new(NatsPublisher::new(client))
            }
            Err(e) => {
                warn!(%url, error = %e, "NATS unavailable, logging events instead");
                Arc::new(LogPublisher)
            }
        },
        None => Arc::new(LogPublisher),
    };

    let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(&config.media_dir, &config.media_base_url).await?);
    let services = Services::new(repos, media, publisher, &config.currency, config.admin_uids.clone());
    let app = api::router(AppState::new(services), Some(config.media_dir.clone()));

    let address = format!("0.0.0.0:{}", config.port);
    info!("UniCart storefront listening on {address}");
    axum::serve(TcpListener::bind(&address).await?, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
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
}
