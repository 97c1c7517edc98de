//! Channel configuration

use serde::{Deserialize, Serialize};

/// Parameters of the simulated RF channel
///
/// `slot_time_ms` and `persistence` are accepted for compatibility with TNC
/// configuration surfaces, but only the propagation delay and TXDelay feed
/// the busy-window computation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelConfig {
    /// TCP ports to listen on, one logical channel segment each
    #[serde(default = "default_ports")]
    pub ports: Vec<u16>,

    /// Simulated signal travel time between transmission and reception
    #[serde(default = "default_propagation_delay_ms")]
    pub propagation_delay_ms: u64,

    /// Transmitter keyup time added to every frame's on-air duration
    #[serde(default = "default_txdelay_ms")]
    pub txdelay_ms: u64,

    /// p-persistence slot time (accepted, unused by the timing model)
    #[serde(default = "default_slot_time_ms")]
    pub slot_time_ms: u64,

    /// p-persistence value 0-255 (accepted, unused by the timing model)
    #[serde(default = "default_persistence")]
    pub persistence: u8,

    /// Probability of flipping each payload bit during relay (0.0 = perfect)
    #[serde(default)]
    pub bit_error_rate: f64,

    /// Assumed on-air bitrate for frame duration computation
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
}

fn default_ports() -> Vec<u16> {
    vec![8001, 8002]
}

fn default_propagation_delay_ms() -> u64 {
    10
}

fn default_txdelay_ms() -> u64 {
    100
}

fn default_slot_time_ms() -> u64 {
    10
}

fn default_persistence() -> u8 {
    63
}

fn default_bitrate() -> u32 {
    1200
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            ports: default_ports(),
            propagation_delay_ms: default_propagation_delay_ms(),
            txdelay_ms: default_txdelay_ms(),
            slot_time_ms: default_slot_time_ms(),
            persistence: default_persistence(),
            bit_error_rate: 0.0,
            bitrate: default_bitrate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChannelConfig::default();
        assert_eq!(config.ports, vec![8001, 8002]);
        assert_eq!(config.propagation_delay_ms, 10);
        assert_eq!(config.txdelay_ms, 100);
        assert_eq!(config.bit_error_rate, 0.0);
        assert_eq!(config.bitrate, 1200);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ChannelConfig =
            serde_json::from_str(r#"{ "ports": [9001], "bit_error_rate": 0.001 }"#).unwrap();
        assert_eq!(config.ports, vec![9001]);
        assert_eq!(config.bit_error_rate, 0.001);
        assert_eq!(config.txdelay_ms, 100);
        assert_eq!(config.persistence, 63);
    }
}
