//! Shared RF channel model
//!
//! [`RfChannel`] owns all shared medium state: the per-port station
//! registry, the busy-window bookkeeping, the collision counter, and the
//! duplicate-detection digest table. Everything lives behind one mutex with
//! a minimal lock-scoped API; callers never touch the collections, and no
//! I/O or await happens while the lock is held.
//!
//! The channel models real RF behavior rather than a clean relay:
//! - broadcast medium: every station hears every other station, across ports
//! - transmissions into a busy window are counted as collisions but still
//!   relayed, so the device under test gets to observe the condition
//! - byte-identical repeats within one second are flagged as duplicates,
//!   also without being suppressed
//! - an optional bit error rate corrupts relayed payloads at random

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use ax_protocol::{ax25, kiss, Ax25Frame};
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ChannelConfig;
use crate::events::ChannelEvent;
use crate::station::{Station, StationHandle, StationInfo};

/// Window within which a byte-identical frame is flagged as a duplicate
const DUPLICATE_WINDOW: Duration = Duration::from_secs(1);

/// Digest entries older than this are evicted opportunistically
const DIGEST_HORIZON: Duration = Duration::from_secs(5);

/// Counters describing channel activity since startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelStats {
    /// Currently connected stations, across all ports
    pub stations: usize,
    /// Frames accepted onto the channel
    pub frames: u64,
    /// Transmissions that started inside another frame's busy window
    pub collisions: u64,
}

/// Interior state, guarded by the channel mutex
#[derive(Debug, Default)]
struct ChannelState {
    /// Registry: port -> handle -> station
    stations: HashMap<u16, HashMap<StationHandle, Station>>,
    /// Next handle to assign
    next_handle: u32,
    /// Channel-wide frame sequence counter
    frame_counter: u64,
    /// End of the current on-air window, if any transmission has occurred
    busy_until: Option<Instant>,
    /// Collisions observed since startup
    collision_count: u64,
    /// Content digest -> last-seen time, for duplicate flagging
    recent_frames: HashMap<u64, Instant>,
}

impl ChannelState {
    fn station_mut(&mut self, handle: StationHandle) -> Option<&mut Station> {
        self.stations
            .values_mut()
            .find_map(|port| port.get_mut(&handle))
    }

    /// Delivery queues of every station except the sender, across all ports
    fn recipients_excluding(
        &self,
        sender: StationHandle,
    ) -> Vec<(StationHandle, mpsc::Sender<Vec<u8>>)> {
        self.stations
            .values()
            .flat_map(|port| port.values())
            .filter(|station| station.handle != sender)
            .map(|station| (station.handle, station.delivery_tx.clone()))
            .collect()
    }
}

/// The simulated shared medium
#[derive(Debug)]
pub struct RfChannel {
    config: ChannelConfig,
    state: Mutex<ChannelState>,
    event_tx: mpsc::Sender<ChannelEvent>,
}

impl RfChannel {
    /// Create a channel with the given parameters, emitting activity through
    /// `event_tx`
    pub fn new(config: ChannelConfig, event_tx: mpsc::Sender<ChannelEvent>) -> Self {
        Self {
            config,
            state: Mutex::new(ChannelState::default()),
            event_tx,
        }
    }

    /// The channel's configuration
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Register a new station and assign it the next handle
    pub async fn register_station(
        &self,
        port: u16,
        remote_addr: String,
        delivery_tx: mpsc::Sender<Vec<u8>>,
    ) -> StationHandle {
        let handle = {
            let mut state = self.state.lock().unwrap();
            state.next_handle += 1;
            let handle = StationHandle(state.next_handle);
            state.stations.entry(port).or_default().insert(
                handle,
                Station::new(handle, port, remote_addr.clone(), delivery_tx),
            );
            handle
        };

        debug!("station {handle} connected on port {port} from {remote_addr}");
        let _ = self
            .event_tx
            .send(ChannelEvent::StationConnected {
                handle,
                port,
                remote_addr,
            })
            .await;
        handle
    }

    /// Remove a station from the registry
    ///
    /// In-flight relays of frames it already transmitted still complete.
    pub async fn unregister_station(&self, handle: StationHandle) {
        let removed = {
            let mut state = self.state.lock().unwrap();
            state
                .stations
                .values_mut()
                .find_map(|port| port.remove(&handle))
        };

        if let Some(station) = removed {
            debug!(
                "station {handle} disconnected (TX:{} RX:{})",
                station.tx_count, station.rx_count
            );
            let _ = self
                .event_tx
                .send(ChannelEvent::StationDisconnected {
                    handle,
                    tx_count: station.tx_count,
                    rx_count: station.rx_count,
                })
                .await;
        }
    }

    /// Snapshot of all connected stations
    pub fn stations(&self) -> Vec<StationInfo> {
        let state = self.state.lock().unwrap();
        let mut stations: Vec<StationInfo> = state
            .stations
            .values()
            .flat_map(|port| port.values())
            .map(StationInfo::from)
            .collect();
        stations.sort_by_key(|info| info.handle.0);
        stations
    }

    /// Snapshot of the channel counters
    pub fn stats(&self) -> ChannelStats {
        let state = self.state.lock().unwrap();
        ChannelStats {
            stations: state.stations.values().map(HashMap::len).sum(),
            frames: state.frame_counter,
            collisions: state.collision_count,
        }
    }

    /// Transmit a KISS frame from a station onto the channel
    ///
    /// `frame` is the unescaped frame content: the KISS type/port byte
    /// followed by the AX.25 bytes. The frame is relayed to every other
    /// connected station after the configured propagation delay, even when a
    /// collision or duplicate is detected; those conditions are reported,
    /// not enforced.
    pub async fn transmit(&self, frame: Vec<u8>, from: StationHandle) {
        if frame.len() < 2 {
            debug!("station {from}: dropping runt frame ({} bytes)", frame.len());
            return;
        }

        let type_byte = frame[0];
        if !kiss::is_data_type(type_byte) {
            // TNC parameter frames configure a modem, they never go on air
            debug!("station {from}: ignoring KISS control frame 0x{type_byte:02X}");
            return;
        }

        let ax25_data = &frame[1..];
        if ax25_data.len() < ax25::MIN_FRAME_LEN {
            warn!(
                "station {from}: frame too short ({} bytes), not relayed",
                ax25_data.len()
            );
            return;
        }

        // Classification is for reporting only; undecodable headers are
        // still relayed byte-for-byte.
        let summary = match Ax25Frame::decode(ax25_data) {
            Ok(decoded) => decoded.to_string(),
            Err(e) => {
                debug!("station {from}: cannot classify frame: {e}");
                "<unclassified>".to_string()
            }
        };

        let digest = frame_digest(ax25_data);
        let now = Instant::now();

        let (frame_id, collision, duplicate) = {
            let mut state = self.state.lock().unwrap();

            let collision = state.busy_until.is_some_and(|busy| now < busy);
            if collision {
                state.collision_count += 1;
            }
            // Last writer wins: the newest transmission redefines the window
            state.busy_until = Some(now + self.frame_duration(ax25_data.len()));

            state.frame_counter += 1;
            let frame_id = state.frame_counter;
            if let Some(station) = state.station_mut(from) {
                station.tx_count += 1;
            }

            let duplicate = state
                .recent_frames
                .get(&digest)
                .is_some_and(|&seen| now.duration_since(seen) < DUPLICATE_WINDOW);
            state.recent_frames.insert(digest, now);
            state
                .recent_frames
                .retain(|_, seen| now.duration_since(*seen) <= DIGEST_HORIZON);

            (frame_id, collision, duplicate)
        };

        if collision {
            warn!("collision: station {from} transmitted during busy channel");
            let _ = self
                .event_tx
                .send(ChannelEvent::Collision { station: from })
                .await;
        }

        debug!(
            "[{frame_id:04}] TX station {from}: {summary}{}",
            if duplicate { " [DUPE]" } else { "" }
        );
        let _ = self
            .event_tx
            .send(ChannelEvent::FrameTransmitted {
                id: frame_id,
                from,
                summary,
                duplicate,
            })
            .await;

        tokio::time::sleep(Duration::from_millis(self.config.propagation_delay_ms)).await;

        let mut ax25_out = ax25_data.to_vec();
        if self.config.bit_error_rate > 0.0 {
            apply_bit_errors(&mut ax25_out, self.config.bit_error_rate);
        }

        let mut relayed = Vec::with_capacity(ax25_out.len() + 1);
        relayed.push(type_byte);
        relayed.extend_from_slice(&ax25_out);
        let wire = kiss::encode(&relayed);

        let recipients = {
            let state = self.state.lock().unwrap();
            state.recipients_excluding(from)
        };

        let mut delivered = 0usize;
        for (handle, delivery_tx) in recipients {
            if delivery_tx.send(wire.clone()).await.is_ok() {
                delivered += 1;
                let mut state = self.state.lock().unwrap();
                if let Some(station) = state.station_mut(handle) {
                    station.rx_count += 1;
                }
            } else {
                warn!("failed to deliver frame {frame_id} to station {handle}");
                let _ = self
                    .event_tx
                    .send(ChannelEvent::DeliveryFailed { station: handle })
                    .await;
            }
        }

        debug!("[{frame_id:04}] delivered to {delivered} station(s)");
        let _ = self
            .event_tx
            .send(ChannelEvent::Delivered {
                id: frame_id,
                recipients: delivered,
            })
            .await;
    }

    /// On-air time of a frame: payload bits at the assumed bitrate, plus the
    /// transmitter keyup delay
    fn frame_duration(&self, ax25_len: usize) -> Duration {
        let bits = (ax25_len * 8) as f64;
        Duration::from_secs_f64(bits / f64::from(self.config.bitrate.max(1)))
            + Duration::from_millis(self.config.txdelay_ms)
    }
}

/// Truncated content digest used for duplicate detection
fn frame_digest(data: &[u8]) -> u64 {
    let digest = Sha256::digest(data);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Flip each bit independently with probability `rate`
fn apply_bit_errors(data: &mut [u8], rate: f64) {
    let mut rng = rand::thread_rng();
    for byte in data {
        for bit in 0..8 {
            if rng.gen::<f64>() < rate {
                *byte ^= 1 << bit;
            }
        }
    }
}
