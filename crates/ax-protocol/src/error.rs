//! Error types for AX.25 frame parsing and encoding

use thiserror::Error;

/// Errors that can occur while decoding or building an AX.25 frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Buffer too short to hold the mandatory header fields
    #[error("truncated frame: need {needed} more bytes")]
    Truncated { needed: usize },

    /// Callsign is empty, too long, or contains a non-encodable character
    #[error("invalid callsign: {0}")]
    InvalidCallsign(String),

    /// SSID outside the 0-15 range
    #[error("invalid SSID: {0}")]
    InvalidSsid(u8),
}
