use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{net::TcpListener, signal, time};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smart_energy_service::{
    api::{self, AppState},
    config::Config,
    control::ControlService,
    db, mqtt,
    reading_cache::ReadingCache,
    telemetry::TelemetryService,
};

const MQTT_DISCONNECT_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; env vars may also be set externally
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    // Open the SQLite file and make sure the table exists
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!(database_url = %config.database_url, "Database ready");

    let cache = ReadingCache::new();

    // One MQTT client: the event loop feeds the subscriber, the handle publishes commands
    let (mqtt_client, eventloop) = mqtt::connect(&config);
    info!(host = %config.broker.host, port = config.broker.port, "Connecting to MQTT broker");

    let mut subscriber = {
        let telemetry = TelemetryService::new(pool.clone(), cache.clone());
        tokio::spawn(mqtt::run_subscriber(mqtt_client.clone(), eventloop, telemetry))
    };

    let state = AppState {
        pool: pool.clone(),
        cache,
        control: ControlService::new(Arc::new(mqtt_client.clone())),
        energy_cost_rate: config.energy_cost_rate,
    };

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Smart energy API listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Close the bus connection, then the store
    if let Err(e) = mqtt_client.try_disconnect() {
        warn!(error = %e, "Failed to queue MQTT disconnect");
    }
    if time::timeout(MQTT_DISCONNECT_GRACE, &mut subscriber).await.is_err() {
        warn!("MQTT subscriber did not stop in time; aborting");
        subscriber.abort();
    }
    pool.close().await;
    info!("Database connection closed");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
