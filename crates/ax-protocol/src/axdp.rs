//! AXDP Application Marker
//!
//! Terminal applications prefix structured payloads inside UI/I frames with a
//! 4-byte magic followed by TLV records (tag byte, big-endian u16 length,
//! value). The channel recognizes the marker purely to label traffic in logs
//! and displays; it never validates or rejects AXDP content.

/// Payload prefix marking an AXDP message
pub const MAGIC: &[u8; 4] = b"AXT1";

/// Known TLV tags
pub mod tag {
    /// Message type (single byte)
    pub const MESSAGE_TYPE: u8 = 0x01;
    /// Session identifier (u16)
    pub const SESSION_ID: u8 = 0x02;
    /// Message identifier (u32)
    pub const MESSAGE_ID: u8 = 0x03;
    /// UTF-8 text body
    pub const TEXT: u8 = 0x06;
}

/// Returns true if the payload carries the AXDP marker
pub fn is_axdp(payload: &[u8]) -> bool {
    payload.starts_with(MAGIC)
}

/// One tag-length-value record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    /// Record tag
    pub tag: u8,
    /// Record value bytes
    pub value: Vec<u8>,
}

/// Walk the TLV records after the magic
///
/// Lenient by design: returns the records that parse cleanly and stops at
/// the first truncated one. A payload without the marker yields nothing.
pub fn parse_tlvs(payload: &[u8]) -> Vec<Tlv> {
    if !is_axdp(payload) {
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut rest = &payload[MAGIC.len()..];
    while rest.len() >= 3 {
        let tag = rest[0];
        let len = u16::from_be_bytes([rest[1], rest[2]]) as usize;
        let Some(value) = rest.get(3..3 + len) else {
            break;
        };
        records.push(Tlv {
            tag,
            value: value.to_vec(),
        });
        rest = &rest[3 + len..];
    }
    records
}

/// Extract the text body from an AXDP payload, if present
pub fn message_text(payload: &[u8]) -> Option<String> {
    parse_tlvs(payload)
        .into_iter()
        .find(|tlv| tlv.tag == tag::TEXT)
        .map(|tlv| String::from_utf8_lossy(&tlv.value).into_owned())
}

/// Encode TLV records behind the magic (used by test-frame generators)
pub fn encode_tlvs(records: &[Tlv]) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAGIC.len() + records.len() * 8);
    out.extend_from_slice(MAGIC);
    for record in records {
        out.push(record.tag);
        out.extend_from_slice(&(record.value.len() as u16).to_be_bytes());
        out.extend_from_slice(&record.value);
    }
    out
}

/// Build a chat message payload with the given text
pub fn build_chat(session_id: u16, message_id: u32, text: &str) -> Vec<u8> {
    encode_tlvs(&[
        Tlv {
            tag: tag::MESSAGE_TYPE,
            value: vec![0x01],
        },
        Tlv {
            tag: tag::SESSION_ID,
            value: session_id.to_be_bytes().to_vec(),
        },
        Tlv {
            tag: tag::MESSAGE_ID,
            value: message_id.to_be_bytes().to_vec(),
        },
        Tlv {
            tag: tag::TEXT,
            value: text.as_bytes().to_vec(),
        },
    ])
}
