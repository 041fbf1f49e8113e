//! Binary codec for encoding and decoding Airpong link frames.
//!
//! Wire format:
//! ```text
//! tag frames:      [tag:1..3]                    (discovery / join handshake)
//! snapshot frame:  [tick:4][scored:1][paddle:4][ball_x:4][ball_y:4]
//!                  [ball_speed_x:4][ball_speed_y:4]   = 25 bytes
//! ```
//! All multi-byte integers are big-endian.  Decoding is pure length+prefix
//! dispatch: any length/prefix combination outside the table is reported as
//! a [`FrameError`], which callers log and drop.  Nothing here is fatal and
//! nothing panics — an unauthenticated radio can deliver arbitrary bytes.

use crate::protocol::messages::{
    LinkMessage, TickSnapshot, SNAPSHOT_SIZE, TAG_ACK, TAG_DISCOVERY, TAG_JOIN,
};
use thiserror::Error;

/// Errors that can occur while decoding a received frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The frame's length matches no entry in the dispatch table.
    #[error("unrecognized frame length: {0} bytes")]
    UnknownLength(usize),

    /// The frame's length is valid but its tag bytes are not.
    #[error("unrecognized {len}-byte frame: {bytes:02X?}")]
    UnknownTag { len: usize, bytes: [u8; 3] },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`LinkMessage`] into its wire bytes.
///
/// Tag frames encode to their 1–3 tag bytes; snapshot frames encode to the
/// fixed 25-byte layout.  Encoding cannot fail.
///
/// # Examples
///
/// ```rust
/// use airpong_core::{decode_frame, encode_frame, LinkMessage};
///
/// let bytes = encode_frame(&LinkMessage::DiscoveryProbe);
/// assert_eq!(bytes, vec![b'D']);
/// assert_eq!(decode_frame(&bytes).unwrap(), LinkMessage::DiscoveryProbe);
/// ```
pub fn encode_frame(msg: &LinkMessage) -> Vec<u8> {
    match msg {
        LinkMessage::Tick(snapshot) => encode_snapshot(snapshot),
        tagged => tagged
            .tag()
            .expect("every non-Tick message has a tag")
            .to_vec(),
    }
}

/// Decodes one [`LinkMessage`] from a received datagram.
///
/// # Errors
///
/// Returns [`FrameError`] for any length/prefix combination outside the
/// protocol table.  The caller is expected to trace and drop such frames.
pub fn decode_frame(bytes: &[u8]) -> Result<LinkMessage, FrameError> {
    match bytes.len() {
        1 => match bytes[0] {
            TAG_DISCOVERY => Ok(LinkMessage::DiscoveryProbe),
            TAG_JOIN => Ok(LinkMessage::JoinRequest),
            _ => Err(unknown_tag(bytes)),
        },
        2 => match [bytes[0], bytes[1]] {
            [TAG_ACK, TAG_DISCOVERY] => Ok(LinkMessage::DiscoveryAck),
            [TAG_ACK, TAG_JOIN] => Ok(LinkMessage::JoinAck),
            _ => Err(unknown_tag(bytes)),
        },
        3 => match [bytes[0], bytes[1], bytes[2]] {
            [TAG_ACK, TAG_JOIN, TAG_ACK] => Ok(LinkMessage::JoinAccept),
            [TAG_ACK, TAG_JOIN, TAG_DISCOVERY] => Ok(LinkMessage::JoinDecline),
            _ => Err(unknown_tag(bytes)),
        },
        SNAPSHOT_SIZE => Ok(LinkMessage::Tick(decode_snapshot(bytes))),
        other => Err(FrameError::UnknownLength(other)),
    }
}

fn unknown_tag(bytes: &[u8]) -> FrameError {
    let mut copy = [0u8; 3];
    copy[..bytes.len()].copy_from_slice(bytes);
    FrameError::UnknownTag {
        len: bytes.len(),
        bytes: copy,
    }
}

// ── Snapshot layout ───────────────────────────────────────────────────────────

fn encode_snapshot(s: &TickSnapshot) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SNAPSHOT_SIZE);
    buf.extend_from_slice(&s.tick_count.to_be_bytes());
    buf.push(if s.scored { 0x01 } else { 0x00 });
    buf.extend_from_slice(&s.paddle_pos.to_be_bytes());
    buf.extend_from_slice(&s.ball_x.to_be_bytes());
    buf.extend_from_slice(&s.ball_y.to_be_bytes());
    buf.extend_from_slice(&s.ball_speed_x.to_be_bytes());
    buf.extend_from_slice(&s.ball_speed_y.to_be_bytes());
    debug_assert_eq!(buf.len(), SNAPSHOT_SIZE);
    buf
}

/// Decodes the fixed snapshot layout.  The caller guarantees
/// `bytes.len() == SNAPSHOT_SIZE`.
fn decode_snapshot(bytes: &[u8]) -> TickSnapshot {
    TickSnapshot {
        tick_count: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        scored: bytes[4] != 0,
        paddle_pos: read_i32(bytes, 5),
        ball_x: read_i32(bytes, 9),
        ball_y: read_i32(bytes, 13),
        ball_speed_x: read_i32(bytes, 17),
        ball_speed_y: read_i32(bytes, 21),
    }
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> TickSnapshot {
        TickSnapshot {
            tick_count: 42,
            scored: true,
            paddle_pos: 67,
            ball_x: 10,
            ball_y: -20,
            ball_speed_x: 2,
            ball_speed_y: -3,
        }
    }

    #[test]
    fn test_tag_frames_encode_to_expected_bytes() {
        // Arrange / Act / Assert — the wire table from the protocol spec.
        assert_eq!(encode_frame(&LinkMessage::DiscoveryProbe), b"D".to_vec());
        assert_eq!(encode_frame(&LinkMessage::DiscoveryAck), b"AD".to_vec());
        assert_eq!(encode_frame(&LinkMessage::JoinRequest), b"J".to_vec());
        assert_eq!(encode_frame(&LinkMessage::JoinAck), b"AJ".to_vec());
        assert_eq!(encode_frame(&LinkMessage::JoinAccept), b"AJA".to_vec());
        assert_eq!(encode_frame(&LinkMessage::JoinDecline), b"AJD".to_vec());
    }

    #[test]
    fn test_snapshot_encodes_to_fixed_size() {
        let bytes = encode_frame(&LinkMessage::Tick(sample_snapshot()));
        assert_eq!(bytes.len(), SNAPSHOT_SIZE);
    }

    #[test]
    fn test_snapshot_round_trip_preserves_all_fields() {
        // Arrange
        let original = LinkMessage::Tick(sample_snapshot());

        // Act
        let decoded = decode_frame(&encode_frame(&original)).expect("decode must succeed");

        // Assert
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_snapshot_with_negative_extremes_round_trips() {
        let original = LinkMessage::Tick(TickSnapshot {
            tick_count: u32::MAX,
            scored: false,
            paddle_pos: i32::MIN,
            ball_x: i32::MAX,
            ball_y: i32::MIN,
            ball_speed_x: -1,
            ball_speed_y: 1,
        });

        assert_eq!(decode_frame(&encode_frame(&original)), Ok(original));
    }

    #[test]
    fn test_decode_rejects_unknown_lengths() {
        // Empty, in-between, and oversized frames must all be rejected.
        for len in [0usize, 4, 5, 24, 26, 100] {
            let bytes = vec![0u8; len];
            assert_eq!(
                decode_frame(&bytes),
                Err(FrameError::UnknownLength(len)),
                "length {len} must be rejected"
            );
        }
    }

    #[test]
    fn test_decode_rejects_unknown_tags() {
        // Valid lengths, invalid prefixes.
        for bad in [&b"X"[..], b"AX", b"DA", b"AJX", b"XJA"] {
            assert!(
                matches!(decode_frame(bad), Err(FrameError::UnknownTag { .. })),
                "{bad:?} must be rejected"
            );
        }
    }

    #[test]
    fn test_decode_never_panics_on_arbitrary_bytes() {
        // The radio is unauthenticated; feed a spread of junk.
        for len in 0..64usize {
            let bytes: Vec<u8> = (0..len).map(|i| (i * 37) as u8).collect();
            let _ = decode_frame(&bytes);
        }
    }
}
