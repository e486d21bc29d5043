//! API server entry point.

use api::config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use store::{InMemoryStorage, PostgresStorage, Storage};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<S: Storage + 'static>(config: &Config, storage: S, metrics_handle: PrometheusHandle) {
    let state = api::create_default_state(storage, config.shipping_rates());
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    match config.database_url.as_deref() {
        Some(url) => {
            let storage = PostgresStorage::connect(url)
                .await
                .expect("failed to connect to database");
            storage
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using postgres storage");
            serve(&config, storage, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            serve(&config, InMemoryStorage::new(), metrics_handle).await;
        }
    }

    tracing::info!("server shut down gracefully");
}
