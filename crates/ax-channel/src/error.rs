//! Error types for the channel engine

use thiserror::Error;

/// Errors that can occur while running the channel
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No listener ports configured
    #[error("no listener ports configured")]
    NoPorts,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An accept loop terminated unexpectedly
    #[error("accept loop for port {port} terminated")]
    AcceptLoopFailed { port: u16 },
}
