//! Integration tests for the airpong-core wire codec.
//!
//! These tests verify complete round-trip encoding and decoding of every
//! frame in the protocol table through the public API, plus rejection of
//! everything outside the table.

use airpong_core::{decode_frame, encode_frame, FrameError, LinkMessage, TickSnapshot};

/// Encodes a message and then decodes it, asserting that the decoded
/// message matches the original.
fn roundtrip(msg: LinkMessage) -> LinkMessage {
    let bytes = encode_frame(&msg);
    decode_frame(&bytes).expect("decode must succeed")
}

#[test]
fn test_roundtrip_discovery_probe() {
    let original = LinkMessage::DiscoveryProbe;
    assert_eq!(original, roundtrip(original));
}

#[test]
fn test_roundtrip_discovery_ack() {
    let original = LinkMessage::DiscoveryAck;
    assert_eq!(original, roundtrip(original));
}

#[test]
fn test_roundtrip_join_request() {
    let original = LinkMessage::JoinRequest;
    assert_eq!(original, roundtrip(original));
}

#[test]
fn test_roundtrip_join_ack() {
    let original = LinkMessage::JoinAck;
    assert_eq!(original, roundtrip(original));
}

#[test]
fn test_roundtrip_join_accept_and_decline() {
    assert_eq!(LinkMessage::JoinAccept, roundtrip(LinkMessage::JoinAccept));
    assert_eq!(LinkMessage::JoinDecline, roundtrip(LinkMessage::JoinDecline));
}

#[test]
fn test_roundtrip_tick_snapshot() {
    let original = LinkMessage::Tick(TickSnapshot {
        tick_count: 1_000_003,
        scored: false,
        paddle_pos: 67,
        ball_x: 12,
        ball_y: 228,
        ball_speed_x: -5,
        ball_speed_y: 2,
    });

    assert_eq!(original, roundtrip(original));
}

#[test]
fn test_every_tag_frame_has_distinct_wire_bytes() {
    // Two different frames must never encode identically.
    let frames = [
        LinkMessage::DiscoveryProbe,
        LinkMessage::DiscoveryAck,
        LinkMessage::JoinRequest,
        LinkMessage::JoinAck,
        LinkMessage::JoinAccept,
        LinkMessage::JoinDecline,
    ];
    let mut encodings: Vec<Vec<u8>> = frames.iter().map(encode_frame).collect();
    encodings.sort();
    encodings.dedup();
    assert_eq!(encodings.len(), frames.len());
}

#[test]
fn test_decode_rejects_frames_outside_the_table() {
    // A length the table does not know.
    assert_eq!(decode_frame(&[0u8; 10]), Err(FrameError::UnknownLength(10)));

    // A known length with an unknown prefix.
    assert!(matches!(
        decode_frame(b"AX"),
        Err(FrameError::UnknownTag { len: 2, .. })
    ));
}
