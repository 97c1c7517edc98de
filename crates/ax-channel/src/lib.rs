//! RF Channel Simulation Engine
//!
//! This crate models a shared half-duplex radio channel over TCP for
//! exercising packet-radio terminal software. Stations connect to per-port
//! KISS listeners; every transmission is broadcast to every other station
//! with realistic channel effects:
//!
//! - fixed propagation delay before delivery
//! - a busy window per frame; transmissions inside it are reported as
//!   collisions (and still relayed, so the device under test sees them)
//! - duplicate flagging for byte-identical frames within a short window
//! - optional random bit corruption for stress testing
//!
//! # Architecture
//!
//! [`RfChannel`] owns all shared state behind one lock with a minimal API;
//! [`ChannelServer`] is the TCP front-end that turns connections into
//! registered stations. Activity is observable through the
//! [`ChannelEvent`] stream.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ax_channel::{ChannelConfig, ChannelServer, RfChannel};
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> Result<(), ax_channel::ChannelError> {
//! let (event_tx, mut event_rx) = mpsc::channel(256);
//! let channel = Arc::new(RfChannel::new(ChannelConfig::default(), event_tx));
//! let server = ChannelServer::bind(channel.config(), Arc::clone(&channel)).await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod server;
pub mod station;

pub use channel::{ChannelStats, RfChannel};
pub use config::ChannelConfig;
pub use error::ChannelError;
pub use events::ChannelEvent;
pub use server::ChannelServer;
pub use station::{StationHandle, StationInfo};
