//! Frame Display Formatting
//!
//! Human-readable one-line summaries of decoded frames, used by the channel
//! log output and by monitoring front-ends.

use std::fmt;

use crate::ax25::{Ax25Frame, FrameType, UnnumberedType};
use crate::axdp;

impl Ax25Frame {
    /// Short type label for this frame
    ///
    /// UI and I frames whose payload carries the AXDP marker are relabeled
    /// `AXDP`; this is presentation metadata only.
    pub fn type_label(&self) -> String {
        if self.frame_type.has_pid() && axdp::is_axdp(&self.payload) {
            return "AXDP".to_string();
        }
        match self.frame_type {
            FrameType::Information => "I".to_string(),
            FrameType::Supervisory(subtype) => subtype.mnemonic().to_string(),
            FrameType::Unnumbered(UnnumberedType::Unknown(control)) => {
                format!("U({control:02X})")
            }
            FrameType::Unnumbered(subtype) => subtype.mnemonic().to_string(),
        }
    }
}

impl fmt::Display for Ax25Frame {
    /// `SRC->DST via A,B TYPE N(S)=x N(R)=y P/F`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.destination)?;

        if !self.via.is_empty() {
            let path: Vec<String> = self.via.iter().map(|a| a.to_string()).collect();
            write!(f, " via {}", path.join(","))?;
        }

        write!(f, " {}", self.type_label())?;

        if let Some(ns) = self.ns {
            write!(f, " N(S)={ns}")?;
        }
        if let Some(nr) = self.nr {
            write!(f, " N(R)={nr}")?;
        }
        if self.poll_final {
            write!(f, " P/F")?;
        }
        Ok(())
    }
}

/// Printable preview of a payload, truncated to `max` bytes
pub fn payload_preview(payload: &[u8], max: usize) -> String {
    let shown = &payload[..payload.len().min(max)];
    let mut preview: String = shown
        .iter()
        .map(|&b| {
            if (0x20..0x7F).contains(&b) {
                b as char
            } else {
                '.'
            }
        })
        .collect();
    if payload.len() > max {
        preview.push_str("...");
    }
    preview
}
