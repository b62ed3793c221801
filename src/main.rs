use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal, sync::mpsc, time};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sensor_telemetry::{
    api::{self, AppState},
    config::Config,
    control::CommandPublisher,
    db::{self, ReadingStore},
    mqtt::{self, TelemetrySubscription},
    sensors::{IngestWorker, SensorService},
};

/// Messages buffered between the MQTT event loop and the ingestion worker.
/// Past this the event loop drops new telemetry rather than stop polling.
const TELEMETRY_BUFFER: usize = 1024;

const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent, env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // The store must be reachable before anything else starts
    let pool = db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("failed to connect to the database")?;
    db::ensure_schema(&pool)
        .await
        .context("failed to create the sensor_data table")?;
    let store = ReadingStore::new(pool);
    info!("Database ready");

    // One broker connection serves both the telemetry subscription and commands
    let (client, event_loop) = mqtt::connect(&config);
    info!(
        host = %config.mqtt_broker.host,
        port = config.mqtt_broker.port,
        tls = config.mqtt_broker.tls,
        "MQTT client configured"
    );

    let (tx, rx) = mpsc::channel(TELEMETRY_BUFFER);
    let worker = tokio::spawn(IngestWorker::new(SensorService::new(store.clone()), rx).run());
    let mut subscription = tokio::spawn(
        TelemetrySubscription::new(client.clone(), event_loop, &config.readings_topic, tx).run(),
    );

    let state = AppState {
        store,
        commands: CommandPublisher::new(client.clone(), &config.command_prefix),
    };

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The subscription stops once the disconnect goes out. Its exit closes the
    // telemetry channel and the worker drains what it already received.
    if let Err(e) = client.try_disconnect() {
        warn!(error = %e, "Failed to queue MQTT disconnect");
    }
    if time::timeout(DISCONNECT_GRACE, &mut subscription).await.is_err() {
        warn!("MQTT disconnect timed out");
        subscription.abort();
    }
    let _ = worker.await;

    info!("Shutdown complete");
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
