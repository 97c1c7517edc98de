//! Unified event stream for the channel
//!
//! All channel activity (station lifecycle, transmissions, collisions,
//! delivery outcomes) is emitted through a single event channel, so a
//! monitor or the server binary can observe everything in one place.

use crate::station::StationHandle;

/// Unified event enum for all channel activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A station connected and was registered
    StationConnected {
        /// Handle assigned to the station
        handle: StationHandle,
        /// Listener port it joined
        port: u16,
        /// Remote peer address
        remote_addr: String,
    },

    /// A station disconnected and was removed from the registry
    StationDisconnected {
        /// Handle of the departed station
        handle: StationHandle,
        /// Frames it transmitted while connected
        tx_count: u64,
        /// Frames delivered to it while connected
        rx_count: u64,
    },

    /// A frame was accepted onto the channel
    FrameTransmitted {
        /// Channel-wide frame sequence number
        id: u64,
        /// Transmitting station
        from: StationHandle,
        /// One-line decoded summary, or a placeholder when unclassifiable
        summary: String,
        /// Byte-identical frame seen within the duplicate window
        duplicate: bool,
    },

    /// A transmission started while the channel was busy
    ///
    /// The frame is still relayed; the collision is reported for analysis.
    Collision {
        /// Station that transmitted into the busy window
        station: StationHandle,
    },

    /// Fan-out for a frame finished
    Delivered {
        /// Channel-wide frame sequence number
        id: u64,
        /// Number of stations the frame reached
        recipients: usize,
    },

    /// A recipient's delivery queue was closed before the frame went out
    DeliveryFailed {
        /// Station that missed the frame
        station: StationHandle,
    },
}

impl ChannelEvent {
    /// Check if this is a station lifecycle event
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            ChannelEvent::StationConnected { .. } | ChannelEvent::StationDisconnected { .. }
        )
    }

    /// Get the station handle if this event concerns a specific station
    pub fn station(&self) -> Option<StationHandle> {
        match self {
            ChannelEvent::StationConnected { handle, .. }
            | ChannelEvent::StationDisconnected { handle, .. } => Some(*handle),
            ChannelEvent::FrameTransmitted { from, .. } => Some(*from),
            ChannelEvent::Collision { station } | ChannelEvent::DeliveryFailed { station } => {
                Some(*station)
            }
            ChannelEvent::Delivered { .. } => None,
        }
    }
}
