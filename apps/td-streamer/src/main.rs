//! TD Streamer Binary
//!
//! Connects to the streamer, logs in, sets the QOS level and subscribes to
//! equity charts and time & sales for the configured symbols, logging every
//! event until interrupted.
//!
//! # Usage
//!
//! ```bash
//! TD_PRINCIPALS_PATH=./principals.json cargo run --bin td-streamer
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `TD_PRINCIPALS_PATH`: JSON file with the user principals bundle
//!
//! ## Optional
//! - `TD_STREAMER_URL`: WebSocket URL override (default: from principals)
//! - `TD_QOS`: express | realtime | fast | moderate | slow | delayed (default: realtime)
//! - `TD_SYMBOLS`: comma-separated symbols (default: SPY)
//! - `TD_STREAMER_METRICS_PORT`: Prometheus metrics port, 0 disables (default: 9090)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: td-streamer)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use td_streamer::application::ports::TransportEvent;
use td_streamer::infrastructure::streamer::{
    Streamer, StreamerEvent, UuidGenerator, WebSocketTransport,
};
use td_streamer::infrastructure::telemetry;
use td_streamer::{SessionContext, StreamerConfig, UserPrincipals, init_metrics};
use tokio::signal;

/// Time allowed for the close handshake on shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("rustls crypto provider already installed"))?;

    load_dotenv();

    let _telemetry_guard = telemetry::init()?;

    tracing::info!("Starting TD streamer");

    let config = StreamerConfig::from_env()?;
    init_metrics(config.metrics_port)?;

    let principals = UserPrincipals::from_file(&config.principals_path).with_context(|| {
        format!(
            "failed to load principals from {}",
            config.principals_path.display()
        )
    })?;
    let session = Arc::new(SessionContext::from_principals(&principals)?);

    let url = config
        .streamer_url
        .clone()
        .unwrap_or_else(|| session.socket_url());

    tracing::info!(
        url = %url,
        account = session.account_id(),
        qos = %config.qos,
        symbols = ?config.symbols,
        metrics_port = config.metrics_port,
        "Configuration loaded"
    );

    let (transport, mut transport_rx) = WebSocketTransport::with_channel(url);
    let (mut streamer, mut events) =
        Streamer::new(session, Arc::new(UuidGenerator), Arc::new(transport));

    let connection = streamer.connect()?;
    tracing::debug!(connection = %connection, "Connection started");

    let shutdown = await_shutdown();
    tokio::pin!(shutdown);

    // True when a live connection was asked to close.
    let closing = loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                break close(&mut streamer);
            }
            Some(event) = transport_rx.recv() => {
                streamer.handle_connection_event(event);
            }
            Some(event) = events.recv() => {
                if !on_event(&streamer, &config, event) {
                    break close(&mut streamer);
                }
            }
        }
    };

    if closing {
        let closed = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            while let Some(event) = transport_rx.recv().await {
                if event.connection == connection && event.event == TransportEvent::Closed {
                    break;
                }
            }
        })
        .await;

        if closed.is_err() {
            tracing::warn!("Timed out waiting for the connection to close");
        }
    }

    tracing::info!("TD streamer stopped");
    Ok(())
}

/// Disconnect gracefully. Returns whether a live connection was closed.
fn close(streamer: &mut Streamer) -> bool {
    let live = streamer.connection().is_some();
    streamer.disconnect(false);
    live
}

/// Handle one streamer event. Returns `false` when the loop should stop.
fn on_event(streamer: &Streamer, config: &StreamerConfig, event: StreamerEvent) -> bool {
    match event {
        StreamerEvent::Authenticated => {
            tracing::info!("Authenticated, subscribing");
            let result = streamer
                .set_qos_level(config.qos)
                .and_then(|_| streamer.subs_chart_equity(&config.symbols, None))
                .and_then(|_| streamer.subs_timesale_equity(&config.symbols, None));

            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to subscribe");
                return false;
            }
        }
        StreamerEvent::AuthenticationFailed(e) => {
            tracing::error!(error = %e, "Login failed");
            return false;
        }
        StreamerEvent::Data {
            category,
            frame,
            snapshot,
        } => {
            tracing::info!(
                event = category.as_str(),
                service = %frame.service,
                records = frame.content.len(),
                snapshot,
                "Data received"
            );
            for record in &frame.content {
                tracing::debug!(record = %serde_json::Value::Object(record.clone()), "Record");
            }
        }
        StreamerEvent::Heartbeat(heartbeat) => {
            tracing::debug!(heartbeat = %heartbeat, "Heartbeat");
        }
        StreamerEvent::Message(text) => {
            tracing::debug!(message = %text, "Response");
        }
        StreamerEvent::Disconnected => {
            tracing::warn!("Streamer disconnected");
            return false;
        }
    }

    true
}

fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn await_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
