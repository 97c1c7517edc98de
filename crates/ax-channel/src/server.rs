//! Connection manager
//!
//! Binds one TCP listener per configured logical port and drives accepted
//! connections: each station gets a reader loop that feeds the KISS decoder
//! and spawns one relay task per completed frame, plus a writer task that
//! drains the station's delivery queue into the socket. A slow frame's
//! propagation-delay sleep therefore never blocks ingestion of the next.

use std::net::SocketAddr;
use std::sync::Arc;

use ax_protocol::KissDecoder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::channel::RfChannel;
use crate::config::ChannelConfig;
use crate::error::ChannelError;

/// Per-station delivery queue depth
const DELIVERY_QUEUE: usize = 64;

/// Socket read buffer size
const READ_BUF: usize = 4096;

/// TCP front-end for the channel
pub struct ChannelServer {
    channel: Arc<RfChannel>,
    listeners: Vec<TcpListener>,
}

impl ChannelServer {
    /// Bind a listener for every configured port
    ///
    /// Port 0 is accepted and bound to an ephemeral port; use
    /// [`local_addrs`](Self::local_addrs) to discover the assignment.
    pub async fn bind(config: &ChannelConfig, channel: Arc<RfChannel>) -> Result<Self, ChannelError> {
        if config.ports.is_empty() {
            return Err(ChannelError::NoPorts);
        }

        let mut listeners = Vec::with_capacity(config.ports.len());
        for &port in &config.ports {
            let listener = TcpListener::bind(("0.0.0.0", port)).await?;
            info!("listening on {}", listener.local_addr()?);
            listeners.push(listener);
        }

        Ok(Self { channel, listeners })
    }

    /// Addresses the listeners actually bound to
    pub fn local_addrs(&self) -> Result<Vec<SocketAddr>, ChannelError> {
        self.listeners
            .iter()
            .map(|listener| listener.local_addr().map_err(ChannelError::from))
            .collect()
    }

    /// Run all accept loops until one fails
    pub async fn run(self) -> Result<(), ChannelError> {
        let mut tasks = Vec::with_capacity(self.listeners.len());
        for listener in self.listeners {
            let port = listener.local_addr()?.port();
            let channel = Arc::clone(&self.channel);
            tasks.push((port, tokio::spawn(accept_loop(listener, channel))));
        }

        for (port, task) in tasks {
            task.await
                .map_err(|_| ChannelError::AcceptLoopFailed { port })?;
        }
        Ok(())
    }
}

/// Accept stations on one listener forever
async fn accept_loop(listener: TcpListener, channel: Arc<RfChannel>) {
    let port = listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or_default();

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let channel = Arc::clone(&channel);
                tokio::spawn(handle_station(stream, peer, port, channel));
            }
            Err(e) => {
                warn!("accept failed on port {port}: {e}");
            }
        }
    }
}

/// Drive one station connection from registration to cleanup
///
/// Every exit path (EOF, read error, task cancellation via drop) runs the
/// deregistration at the bottom, so the registry never leaks a dead station.
async fn handle_station(stream: TcpStream, peer: SocketAddr, port: u16, channel: Arc<RfChannel>) {
    let (mut reader, writer) = stream.into_split();
    let (delivery_tx, delivery_rx) = mpsc::channel(DELIVERY_QUEUE);

    let handle = channel
        .register_station(port, peer.to_string(), delivery_tx)
        .await;

    let writer_task = tokio::spawn(drain_deliveries(delivery_rx, writer, peer));

    let mut decoder = KissDecoder::new();
    let mut buf = vec![0u8; READ_BUF];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                decoder.push_bytes(&buf[..n]);
                while let Some(frame) = decoder.next_frame() {
                    // Relay runs independently so its propagation-delay
                    // sleep does not stall this read loop
                    let channel = Arc::clone(&channel);
                    tokio::spawn(async move {
                        channel.transmit(frame, handle).await;
                    });
                }
            }
            Err(e) => {
                debug!("station {handle}: read error: {e}");
                break;
            }
        }
    }

    channel.unregister_station(handle).await;
    writer_task.abort();
}

/// Writer task: drain the delivery queue into the socket
async fn drain_deliveries(
    mut delivery_rx: mpsc::Receiver<Vec<u8>>,
    mut writer: OwnedWriteHalf,
    peer: SocketAddr,
) {
    while let Some(data) = delivery_rx.recv().await {
        if let Err(e) = writer.write_all(&data).await {
            debug!("write to {peer} failed: {e}");
            break;
        }
    }
}
