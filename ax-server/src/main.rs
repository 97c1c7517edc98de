//! RF Channel Simulator daemon
//!
//! Listens on one KISS-over-TCP port per configured logical channel segment
//! and relays every station's frames to every other station with simulated
//! RF behavior: propagation delay, collision reporting, duplicate flagging,
//! and optional bit errors.
//!
//! Run with an optional JSON config path:
//!
//! ```text
//! ax-server [config.json]
//! ```
//!
//! Any field omitted from the config falls back to its default. Log
//! verbosity follows `RUST_LOG` (default `info`).

use std::sync::Arc;

use anyhow::Context;
use ax_channel::{ChannelConfig, ChannelEvent, ChannelServer, RfChannel};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;

    info!("RF channel simulator starting");
    info!("ports: {:?}", config.ports);
    info!("propagation delay: {}ms", config.propagation_delay_ms);
    info!("TX delay: {}ms", config.txdelay_ms);
    info!("bit error rate: {}", config.bit_error_rate);
    info!("all frames are broadcast to all connected stations");

    let (event_tx, event_rx) = mpsc::channel(1024);
    let channel = Arc::new(RfChannel::new(config.clone(), event_tx));

    tokio::spawn(log_events(event_rx));
    tokio::spawn(log_status(Arc::clone(&channel)));

    let server = ChannelServer::bind(&config, channel)
        .await
        .context("failed to bind listeners")?;
    server.run().await.context("server terminated")?;
    Ok(())
}

/// Load the channel configuration from the optional path argument
fn load_config() -> anyhow::Result<ChannelConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read config {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("cannot parse config {path}"))
        }
        None => Ok(ChannelConfig::default()),
    }
}

/// Turn the channel's event stream into log lines
async fn log_events(mut event_rx: mpsc::Receiver<ChannelEvent>) {
    while let Some(event) = event_rx.recv().await {
        match event {
            ChannelEvent::StationConnected {
                handle,
                port,
                remote_addr,
            } => {
                info!("station {handle} connected on port {port} from {remote_addr}");
            }
            ChannelEvent::StationDisconnected {
                handle,
                tx_count,
                rx_count,
            } => {
                info!("station {handle} disconnected (TX:{tx_count} RX:{rx_count})");
            }
            ChannelEvent::FrameTransmitted {
                id,
                from,
                summary,
                duplicate,
            } => {
                let dupe = if duplicate { " [DUPE]" } else { "" };
                info!("[{id:04}] TX station {from}: {summary}{dupe}");
            }
            ChannelEvent::Collision { station } => {
                warn!("COLLISION: station {station} transmitted during busy channel");
            }
            ChannelEvent::Delivered { id, recipients } => {
                info!("[{id:04}] delivered to {recipients} station(s)");
            }
            ChannelEvent::DeliveryFailed { station } => {
                warn!("failed to deliver to station {station}");
            }
        }
    }
}

/// Periodic one-line status summary
async fn log_status(channel: Arc<RfChannel>) {
    let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        timer.tick().await;
        let stats = channel.stats();
        info!(
            "status: {} station(s), {} frame(s), {} collision(s)",
            stats.stations, stats.frames, stats.collisions
        );
    }
}
