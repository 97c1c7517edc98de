//! AX Protocol Library
//!
//! This crate provides the wire-level pieces of the RF channel simulator:
//!
//! - **KISS framing**: streaming delimiter/escape decoder and encoder for
//!   carrying binary frames over a byte stream
//! - **AX.25 parsing**: address, control-field, and header classification
//!   for link-layer frames (display-oriented, not a connection engine)
//! - **AXDP marker**: recognition of the application-layer TLV payload
//!   prefix used by terminal software, for traffic labeling only
//!
//! # Example
//!
//! ```rust
//! use ax_protocol::kiss::KissDecoder;
//! use ax_protocol::ax25::{Ax25Address, Ax25Frame, build_ui_frame};
//!
//! // Frame some AX.25 bytes over the wire and decode them back
//! let src: Ax25Address = "TEST-1".parse().unwrap();
//! let dst: Ax25Address = "TEST-2".parse().unwrap();
//! let ax25 = build_ui_frame(&src, &dst, &[], b"HELLO");
//!
//! let mut kiss_frame = vec![ax_protocol::kiss::TYPE_DATA];
//! kiss_frame.extend_from_slice(&ax25);
//! let wire = ax_protocol::kiss::encode(&kiss_frame);
//!
//! let mut decoder = KissDecoder::new();
//! decoder.push_bytes(&wire);
//! let frame = decoder.next_frame().unwrap();
//! let decoded = Ax25Frame::decode(&frame[1..]).unwrap();
//! assert_eq!(decoded.payload, b"HELLO");
//! ```

pub mod ax25;
pub mod axdp;
pub mod display;
pub mod error;
pub mod kiss;

pub use ax25::{Ax25Address, Ax25Frame, FrameType, SupervisoryType, UnnumberedType};
pub use error::FrameError;
pub use kiss::KissDecoder;
