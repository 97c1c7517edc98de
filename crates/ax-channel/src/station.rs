//! Station records and handles

use tokio::sync::mpsc;

/// Unique identifier for a station on the channel
///
/// Handles are assigned monotonically at registration and never reused for
/// the lifetime of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationHandle(pub u32);

impl std::fmt::Display for StationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live station connection registered on the channel
///
/// Owned by the channel's registry; identity is the handle, never the value
/// fields. Delivery goes through a bounded queue drained by the connection's
/// writer task, so the channel never performs socket I/O itself.
#[derive(Debug)]
pub(crate) struct Station {
    /// Unique handle
    pub handle: StationHandle,
    /// Logical channel segment (listener port) this station joined
    pub port: u16,
    /// Remote peer address, for logging
    pub remote_addr: String,
    /// Frames this station has transmitted onto the channel
    pub tx_count: u64,
    /// Frames delivered to this station
    pub rx_count: u64,
    /// Delivery queue into the connection's writer task
    pub delivery_tx: mpsc::Sender<Vec<u8>>,
}

impl Station {
    pub(crate) fn new(
        handle: StationHandle,
        port: u16,
        remote_addr: String,
        delivery_tx: mpsc::Sender<Vec<u8>>,
    ) -> Self {
        Self {
            handle,
            port,
            remote_addr,
            tx_count: 0,
            rx_count: 0,
            delivery_tx,
        }
    }
}

/// Point-in-time view of one station, for status displays and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationInfo {
    /// Unique handle
    pub handle: StationHandle,
    /// Logical channel segment
    pub port: u16,
    /// Remote peer address
    pub remote_addr: String,
    /// Frames transmitted by this station
    pub tx_count: u64,
    /// Frames delivered to this station
    pub rx_count: u64,
}

impl From<&Station> for StationInfo {
    fn from(station: &Station) -> Self {
        Self {
            handle: station.handle,
            port: station.port,
            remote_addr: station.remote_addr.clone(),
            tx_count: station.tx_count,
            rx_count: station.rx_count,
        }
    }
}
