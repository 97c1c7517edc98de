//! KISS Framing
//!
//! KISS carries arbitrary binary frames over a byte stream by bounding each
//! frame with `FEND` delimiters and byte-stuffing literal occurrences of the
//! delimiter and escape bytes inside frame content.
//!
//! # Wire Format
//! ```text
//! [FEND] [type/port byte] [escaped frame bytes...] [FEND]
//! ```
//!
//! - `0xC0` (FEND) delimits frames; runs of FEND bytes are idle padding
//! - `0xDB 0xDC` encodes a literal `0xC0` inside a frame
//! - `0xDB 0xDD` encodes a literal `0xDB` inside a frame
//!
//! The first byte of a frame is the KISS type/port indicator: a low nibble of
//! `0x0` marks a data frame, anything else is a TNC parameter frame.
//!
//! The decoder is deliberately lenient: an escape byte followed by anything
//! other than `TFEND`/`TFESC` passes the following byte through unchanged,
//! and an escape byte with nothing after it before the closing delimiter is
//! absorbed. Neither case is treated as an error.

use std::collections::VecDeque;

/// Frame delimiter
pub const FEND: u8 = 0xC0;
/// Escape byte
pub const FESC: u8 = 0xDB;
/// Escaped substitute for a literal FEND
pub const TFEND: u8 = 0xDC;
/// Escaped substitute for a literal FESC
pub const TFESC: u8 = 0xDD;

/// KISS type byte for a data frame on port 0
pub const TYPE_DATA: u8 = 0x00;

/// Returns true if the KISS type byte marks a data frame
///
/// The low nibble carries the frame type; the high nibble is the TNC port.
pub fn is_data_type(type_byte: u8) -> bool {
    type_byte & 0x0F == 0
}

/// Streaming KISS frame decoder
///
/// Push raw bytes from the wire with [`push_bytes`](Self::push_bytes), then
/// drain complete frames with [`next_frame`](Self::next_frame). Emitted
/// frames are fully unescaped and include the leading type/port byte.
/// State carries across calls, so frames may arrive split over any number
/// of reads.
#[derive(Debug, Default)]
pub struct KissDecoder {
    /// Unescaped contents of the frame currently being accumulated
    buffer: Vec<u8>,
    /// Complete frames awaiting pickup
    frames: VecDeque<Vec<u8>>,
    /// Whether an opening FEND has been seen
    in_frame: bool,
    /// Whether the previous byte was an unconsumed FESC
    escaped: bool,
}

impl KissDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
            frames: VecDeque::new(),
            in_frame: false,
            escaped: false,
        }
    }

    /// Push raw bytes into the decoder
    pub fn push_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            if self.escaped {
                self.escaped = false;
                match byte {
                    TFEND => self.buffer.push(FEND),
                    TFESC => self.buffer.push(FESC),
                    // A delimiter right after FESC closes the frame; the
                    // dangling escape is absorbed.
                    FEND => self.close_frame(),
                    // Lenient: pass unknown escape pairs through
                    other => self.buffer.push(other),
                }
            } else if byte == FEND {
                self.close_frame();
            } else if !self.in_frame {
                // Noise before the first delimiter
            } else if byte == FESC {
                self.escaped = true;
            } else {
                self.buffer.push(byte);
            }
        }
    }

    /// Take the next complete frame, if any
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    /// Number of complete frames waiting to be taken
    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    /// Discard any partial frame and buffered state
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.frames.clear();
        self.in_frame = false;
        self.escaped = false;
    }

    /// A delimiter was seen: emit the open frame if it has content, and
    /// open a new one. Back-to-back delimiters emit nothing.
    fn close_frame(&mut self) {
        if self.in_frame && !self.buffer.is_empty() {
            self.frames.push_back(std::mem::take(&mut self.buffer));
        }
        self.buffer.clear();
        self.in_frame = true;
    }
}

/// Escape frame content for transmission
///
/// Replaces literal FEND/FESC bytes with their two-byte escape sequences.
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 8);
    for &byte in data {
        match byte {
            FEND => out.extend_from_slice(&[FESC, TFEND]),
            FESC => out.extend_from_slice(&[FESC, TFESC]),
            other => out.push(other),
        }
    }
    out
}

/// Reverse the escaping transform on frame content
///
/// Unknown escape pairs pass the second byte through; a trailing escape byte
/// is absorbed. Total over all inputs.
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().copied();
    while let Some(byte) = iter.next() {
        if byte == FESC {
            match iter.next() {
                Some(TFEND) => out.push(FEND),
                Some(TFESC) => out.push(FESC),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(byte);
        }
    }
    out
}

/// Wrap frame content in delimiters with escaping applied
///
/// Pure and total: any byte sequence produces a valid wire frame.
pub fn encode(frame: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.len() + 10);
    out.push(FEND);
    out.extend_from_slice(&escape(frame));
    out.push(FEND);
    out
}
