//! AX.25 Frame Parsing
//!
//! Decodes AX.25 link-layer frame headers far enough to classify and display
//! them: destination and source addresses, an optional digipeater (via) path,
//! the control byte, and for I/UI frames the PID byte and information field.
//!
//! # Address Format
//! Each address field is exactly 7 bytes: six callsign characters shifted
//! left by one bit and space-padded, then an SSID byte laid out as
//! `0b0110_0000 | (ssid << 1) | is_last`. The low bit of the SSID byte marks
//! the final address in the chain.
//!
//! # Control Field
//! - bit 0 clear: I frame, N(S) in bits 1-3, N(R) in bits 5-7
//! - bits 0-1 = `01`: S frame, subtype in bits 2-3, N(R) in bits 5-7
//! - bits 0-1 = `11`: U frame, subtype identified with the P/F bit masked out
//!
//! This is a classifier, not a connection engine: sequence numbers are
//! extracted for display, never validated.

use std::str::FromStr;

use crate::error::FrameError;

/// Minimum frame length: destination (7) + source (7)
pub const MIN_FRAME_LEN: usize = 14;

/// Length of one encoded address field
pub const ADDRESS_LEN: usize = 7;

/// Conventional PID byte for "no layer 3" traffic
pub const PID_NO_L3: u8 = 0xF0;

/// A decoded AX.25 address: callsign plus SSID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ax25Address {
    /// Callsign, at most 6 characters, upper-case
    pub callsign: String,
    /// Secondary station identifier, 0-15
    pub ssid: u8,
}

impl Ax25Address {
    /// Create an address, validating callsign and SSID ranges
    pub fn new(callsign: &str, ssid: u8) -> Result<Self, FrameError> {
        let callsign = callsign.trim().to_ascii_uppercase();
        if callsign.is_empty()
            || callsign.len() > 6
            || !callsign.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(FrameError::InvalidCallsign(callsign));
        }
        if ssid > 15 {
            return Err(FrameError::InvalidSsid(ssid));
        }
        Ok(Self { callsign, ssid })
    }

    /// Decode a 7-byte address field
    ///
    /// Returns the address and the is-last flag from the SSID byte.
    pub fn decode(field: &[u8]) -> Result<(Self, bool), FrameError> {
        if field.len() < ADDRESS_LEN {
            return Err(FrameError::Truncated {
                needed: ADDRESS_LEN - field.len(),
            });
        }

        let mut callsign = String::with_capacity(6);
        for &byte in &field[..6] {
            let ch = (byte >> 1) & 0x7F;
            // Space padding (and anything below it) is skipped
            if ch > 0x20 {
                callsign.push(ch as char);
            }
        }

        let ssid_byte = field[6];
        let ssid = (ssid_byte >> 1) & 0x0F;
        let is_last = ssid_byte & 0x01 != 0;

        Ok((Self { callsign, ssid }, is_last))
    }

    /// Encode to the 7-byte wire field
    pub fn encode(&self, is_last: bool) -> [u8; ADDRESS_LEN] {
        let mut field = [b' ' << 1; ADDRESS_LEN];
        for (slot, byte) in field.iter_mut().zip(self.callsign.bytes().take(6)) {
            *slot = byte.to_ascii_uppercase() << 1;
        }
        field[6] = 0x60 | ((self.ssid & 0x0F) << 1) | u8::from(is_last);
        field
    }
}

impl std::fmt::Display for Ax25Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ssid == 0 {
            write!(f, "{}", self.callsign)
        } else {
            write!(f, "{}-{}", self.callsign, self.ssid)
        }
    }
}

impl FromStr for Ax25Address {
    type Err = FrameError;

    /// Parse `CALL` or `CALL-SSID` notation
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((call, ssid)) => {
                let ssid = ssid
                    .parse::<u8>()
                    .map_err(|_| FrameError::InvalidCallsign(s.to_string()))?;
                Self::new(call, ssid)
            }
            None => Self::new(s, 0),
        }
    }
}

/// Supervisory frame subtype (control bits 2-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisoryType {
    /// RR - ready to receive more I frames
    ReceiverReady,
    /// RNR - temporarily unable to receive
    ReceiverNotReady,
    /// REJ - request retransmission from N(R)
    Reject,
    /// SREJ - request retransmission of a single frame
    SelectiveReject,
}

impl SupervisoryType {
    /// Short mnemonic used in frame displays
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::ReceiverReady => "RR",
            Self::ReceiverNotReady => "RNR",
            Self::Reject => "REJ",
            Self::SelectiveReject => "SREJ",
        }
    }
}

/// Unnumbered frame subtype (control byte with the P/F bit masked out)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnnumberedType {
    /// SABM - connection request
    Sabm,
    /// DM - disconnected mode
    Dm,
    /// DISC - disconnect request
    Disc,
    /// UA - unnumbered acknowledge
    Ua,
    /// UI - unnumbered information (connectionless data)
    Ui,
    /// FRMR - frame reject
    Frmr,
    /// XID - exchange identification
    Xid,
    /// TEST - link test
    Test,
    /// Unrecognized; retains the masked control value for display
    Unknown(u8),
}

impl UnnumberedType {
    /// Classify a control byte (P/F bit already ignored via the 0xEF mask)
    pub fn from_control(control: u8) -> Self {
        match control & 0xEF {
            0x2F => Self::Sabm,
            0x0F => Self::Dm,
            0x43 => Self::Disc,
            0x63 => Self::Ua,
            0x03 => Self::Ui,
            0x87 => Self::Frmr,
            0xAF => Self::Xid,
            0xE3 => Self::Test,
            other => Self::Unknown(other),
        }
    }

    /// Short mnemonic used in frame displays
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Sabm => "SABM",
            Self::Dm => "DM",
            Self::Disc => "DISC",
            Self::Ua => "UA",
            Self::Ui => "UI",
            Self::Frmr => "FRMR",
            Self::Xid => "XID",
            Self::Test => "TEST",
            Self::Unknown(_) => "U?",
        }
    }
}

/// Frame class derived from the control byte
///
/// Classification is total: every control value maps to exactly one class.
/// Unrecognized U-frame controls land in [`UnnumberedType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Information frame carrying sequenced data
    Information,
    /// Supervisory frame (flow control / acknowledgment)
    Supervisory(SupervisoryType),
    /// Unnumbered frame (link management or connectionless data)
    Unnumbered(UnnumberedType),
}

impl FrameType {
    /// Classify a raw control byte
    pub fn classify(control: u8) -> Self {
        if control & 0x01 == 0 {
            Self::Information
        } else if control & 0x03 == 0x01 {
            let subtype = match (control >> 2) & 0x03 {
                0 => SupervisoryType::ReceiverReady,
                1 => SupervisoryType::ReceiverNotReady,
                2 => SupervisoryType::Reject,
                _ => SupervisoryType::SelectiveReject,
            };
            Self::Supervisory(subtype)
        } else {
            Self::Unnumbered(UnnumberedType::from_control(control))
        }
    }

    /// True for frames that carry a PID byte (I and UI)
    pub fn has_pid(&self) -> bool {
        matches!(
            self,
            Self::Information | Self::Unnumbered(UnnumberedType::Ui)
        )
    }
}

/// A decoded AX.25 frame header plus payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ax25Frame {
    /// Destination address
    pub destination: Ax25Address,
    /// Source address
    pub source: Ax25Address,
    /// Digipeater path, in routing order
    pub via: Vec<Ax25Address>,
    /// Raw control byte
    pub control: u8,
    /// Frame class derived from the control byte
    pub frame_type: FrameType,
    /// Send sequence N(S), I frames only
    pub ns: Option<u8>,
    /// Receive sequence N(R), I and S frames
    pub nr: Option<u8>,
    /// Poll/Final bit
    pub poll_final: bool,
    /// Protocol ID byte, I and UI frames only
    pub pid: Option<u8>,
    /// Information field
    pub payload: Vec<u8>,
}

impl Ax25Frame {
    /// Decode a frame from raw AX.25 bytes (no KISS framing, no FCS)
    ///
    /// Fails with [`FrameError::Truncated`] when the mandatory addresses or
    /// the control byte are missing. Sequence numbers are extracted only for
    /// the classes that define them.
    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < MIN_FRAME_LEN {
            return Err(FrameError::Truncated {
                needed: MIN_FRAME_LEN - data.len(),
            });
        }

        let (destination, _) = Ax25Address::decode(&data[0..7])?;
        let (source, mut is_last) = Ax25Address::decode(&data[7..14])?;

        let mut via = Vec::new();
        let mut offset = MIN_FRAME_LEN;
        while !is_last && offset + ADDRESS_LEN <= data.len() {
            let (addr, last) = Ax25Address::decode(&data[offset..offset + ADDRESS_LEN])?;
            via.push(addr);
            is_last = last;
            offset += ADDRESS_LEN;
        }

        let Some(&control) = data.get(offset) else {
            return Err(FrameError::Truncated { needed: 1 });
        };
        offset += 1;

        let frame_type = FrameType::classify(control);
        let poll_final = control & 0x10 != 0;
        let (ns, nr) = match frame_type {
            FrameType::Information => (Some((control >> 1) & 0x07), Some((control >> 5) & 0x07)),
            FrameType::Supervisory(_) => (None, Some((control >> 5) & 0x07)),
            FrameType::Unnumbered(_) => (None, None),
        };

        let mut pid = None;
        if frame_type.has_pid() {
            if let Some(&byte) = data.get(offset) {
                pid = Some(byte);
                offset += 1;
            }
        }

        let payload = data.get(offset..).unwrap_or_default().to_vec();

        Ok(Self {
            destination,
            source,
            via,
            control,
            frame_type,
            ns,
            nr,
            poll_final,
            pid,
            payload,
        })
    }

    /// Re-encode the frame to raw AX.25 bytes
    ///
    /// The final address in the chain is always flagged last, whatever the
    /// decoded flags were.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_FRAME_LEN + self.via.len() * ADDRESS_LEN + 2 + self.payload.len());
        out.extend_from_slice(&self.destination.encode(false));
        out.extend_from_slice(&self.source.encode(self.via.is_empty()));
        for (i, addr) in self.via.iter().enumerate() {
            out.extend_from_slice(&addr.encode(i + 1 == self.via.len()));
        }
        out.push(self.control);
        if let Some(pid) = self.pid {
            out.push(pid);
        }
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Build a UI frame (used by test-frame generators)
pub fn build_ui_frame(
    source: &Ax25Address,
    destination: &Ax25Address,
    via: &[Ax25Address],
    payload: &[u8],
) -> Vec<u8> {
    let frame = Ax25Frame {
        destination: destination.clone(),
        source: source.clone(),
        via: via.to_vec(),
        control: 0x03, // UI
        frame_type: FrameType::Unnumbered(UnnumberedType::Ui),
        ns: None,
        nr: None,
        poll_final: false,
        pid: Some(PID_NO_L3),
        payload: payload.to_vec(),
    };
    frame.encode()
}

/// Build a SABM connection request with the poll bit set
pub fn build_sabm(source: &Ax25Address, destination: &Ax25Address) -> Vec<u8> {
    let mut out = Vec::with_capacity(MIN_FRAME_LEN + 1);
    out.extend_from_slice(&destination.encode(false));
    out.extend_from_slice(&source.encode(true));
    out.push(0x3F); // SABM | P
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(s: &str) -> Ax25Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_address_decode() {
        let field = [
            b'T' << 1,
            b'E' << 1,
            b'S' << 1,
            b'T' << 1,
            b' ' << 1,
            b' ' << 1,
            0x60 | (1 << 1) | 0x01,
        ];
        let (address, is_last) = Ax25Address::decode(&field).unwrap();
        assert_eq!(address.callsign, "TEST");
        assert_eq!(address.ssid, 1);
        assert!(is_last);
    }

    #[test]
    fn test_address_display() {
        assert_eq!(addr("N0CALL").to_string(), "N0CALL");
        assert_eq!(addr("TEST-7").to_string(), "TEST-7");
    }

    #[test]
    fn test_address_validation() {
        assert!(Ax25Address::new("TOOLONGCALL", 0).is_err());
        assert!(Ax25Address::new("", 0).is_err());
        assert!(Ax25Address::new("AB/C", 0).is_err());
        assert!(Ax25Address::new("TEST", 16).is_err());
        assert!(Ax25Address::new("test", 15).is_ok());
    }

    #[test]
    fn test_classify_all_controls_is_total() {
        for control in 0u16..=255 {
            let control = control as u8;
            let frame_type = FrameType::classify(control);
            match frame_type {
                FrameType::Information => assert_eq!(control & 0x01, 0),
                FrameType::Supervisory(_) => assert_eq!(control & 0x03, 0x01),
                FrameType::Unnumbered(_) => assert_eq!(control & 0x03, 0x03),
            }
        }
    }

    #[test]
    fn test_known_unnumbered_subtypes() {
        let cases = [
            (0x2F, UnnumberedType::Sabm),
            (0x0F, UnnumberedType::Dm),
            (0x43, UnnumberedType::Disc),
            (0x63, UnnumberedType::Ua),
            (0x03, UnnumberedType::Ui),
            (0x87, UnnumberedType::Frmr),
            (0xAF, UnnumberedType::Xid),
            (0xE3, UnnumberedType::Test),
        ];
        for (control, expected) in cases {
            assert_eq!(UnnumberedType::from_control(control), expected);
            // P/F bit must not change the classification
            assert_eq!(UnnumberedType::from_control(control | 0x10), expected);
        }
        assert_eq!(
            UnnumberedType::from_control(0xEF),
            UnnumberedType::Unknown(0xEF)
        );
    }

    #[test]
    fn test_decode_ui_frame() {
        let raw = build_ui_frame(&addr("TEST-1"), &addr("TEST-2"), &[], b"HELLO");
        let frame = Ax25Frame::decode(&raw).unwrap();
        assert_eq!(frame.source, addr("TEST-1"));
        assert_eq!(frame.destination, addr("TEST-2"));
        assert!(frame.via.is_empty());
        assert_eq!(
            frame.frame_type,
            FrameType::Unnumbered(UnnumberedType::Ui)
        );
        assert_eq!(frame.pid, Some(PID_NO_L3));
        assert_eq!(frame.payload, b"HELLO");
        assert_eq!(frame.ns, None);
        assert_eq!(frame.nr, None);
    }

    #[test]
    fn test_decode_i_frame_sequences() {
        // N(S)=2, N(R)=5, P set: 0b101_1_010_0
        let control = (5 << 5) | 0x10 | (2 << 1);
        let mut raw = Vec::new();
        raw.extend_from_slice(&addr("DEST").encode(false));
        raw.extend_from_slice(&addr("SRC").encode(true));
        raw.push(control);
        raw.push(PID_NO_L3);
        raw.extend_from_slice(b"DATA");

        let frame = Ax25Frame::decode(&raw).unwrap();
        assert_eq!(frame.frame_type, FrameType::Information);
        assert_eq!(frame.ns, Some(2));
        assert_eq!(frame.nr, Some(5));
        assert!(frame.poll_final);
        assert_eq!(frame.payload, b"DATA");
    }

    #[test]
    fn test_decode_supervisory_rr() {
        // RR with N(R)=3: 0b011_0_00_01
        let control = (3 << 5) | 0x01;
        let mut raw = Vec::new();
        raw.extend_from_slice(&addr("DEST").encode(false));
        raw.extend_from_slice(&addr("SRC").encode(true));
        raw.push(control);

        let frame = Ax25Frame::decode(&raw).unwrap();
        assert_eq!(
            frame.frame_type,
            FrameType::Supervisory(SupervisoryType::ReceiverReady)
        );
        assert_eq!(frame.ns, None);
        assert_eq!(frame.nr, Some(3));
        assert!(frame.pid.is_none());
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_decode_via_path() {
        let raw = build_ui_frame(
            &addr("SRC-1"),
            &addr("DST-2"),
            &[addr("RELAY1"), addr("RELAY2-3")],
            b"x",
        );
        let frame = Ax25Frame::decode(&raw).unwrap();
        assert_eq!(frame.via, vec![addr("RELAY1"), addr("RELAY2-3")]);
        assert_eq!(frame.payload, b"x");
    }

    #[test]
    fn test_decode_truncated() {
        assert_eq!(
            Ax25Frame::decode(&[0u8; 10]),
            Err(FrameError::Truncated { needed: 4 })
        );
        // Addresses present but control byte missing
        let mut raw = Vec::new();
        raw.extend_from_slice(&addr("DEST").encode(false));
        raw.extend_from_slice(&addr("SRC").encode(true));
        assert_eq!(
            Ax25Frame::decode(&raw),
            Err(FrameError::Truncated { needed: 1 })
        );
    }

    #[test]
    fn test_decode_sabm() {
        let raw = build_sabm(&addr("TEST-1"), &addr("TEST-2"));
        let frame = Ax25Frame::decode(&raw).unwrap();
        assert_eq!(
            frame.frame_type,
            FrameType::Unnumbered(UnnumberedType::Sabm)
        );
        assert!(frame.poll_final);
        assert!(frame.pid.is_none());
    }

    #[test]
    fn test_frame_encode_round_trip() {
        let raw = build_ui_frame(
            &addr("TEST-1"),
            &addr("TEST-2"),
            &[addr("WIDE1-1")],
            b"payload bytes",
        );
        let frame = Ax25Frame::decode(&raw).unwrap();
        assert_eq!(frame.encode(), raw);
    }

    proptest! {
        #[test]
        fn prop_address_round_trip(
            callsign in "[A-Z0-9]{1,6}",
            ssid in 0u8..16,
            is_last: bool,
        ) {
            let address = Ax25Address::new(&callsign, ssid).unwrap();
            let field = address.encode(is_last);
            let (decoded, last) = Ax25Address::decode(&field).unwrap();
            prop_assert_eq!(decoded, address);
            prop_assert_eq!(last, is_last);
        }

        #[test]
        fn prop_ui_frame_payload_preserved(payload in proptest::collection::vec(any::<u8>(), 0..300)) {
            let raw = build_ui_frame(
                &Ax25Address::new("TEST", 1).unwrap(),
                &Ax25Address::new("TEST", 2).unwrap(),
                &[],
                &payload,
            );
            let frame = Ax25Frame::decode(&raw).unwrap();
            prop_assert_eq!(frame.payload, payload);
        }
    }
}
