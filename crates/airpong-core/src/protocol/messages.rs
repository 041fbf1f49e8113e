//! All Airpong link message types.
//!
//! Every frame on the radio is either a short ASCII tag sequence (discovery
//! and join handshake) or the raw fixed-layout bytes of a [`TickSnapshot`].
//! There is no framing header, checksum, or retransmission: the link is
//! explicitly best-effort, and a receiver identifies a frame purely by its
//! length and leading bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Wire size of an encoded [`TickSnapshot`] in bytes.
///
/// Must stay disjoint from every tag-frame length (1–3 bytes) so that
/// length+prefix dispatch stays unambiguous.
pub const SNAPSHOT_SIZE: usize = 25;

/// Tag byte opening a discovery probe.
pub const TAG_DISCOVERY: u8 = b'D';
/// Tag byte opening a join request.
pub const TAG_JOIN: u8 = b'J';
/// Tag byte opening every acknowledgement frame.
pub const TAG_ACK: u8 = b'A';

// ── Peer addresses ────────────────────────────────────────────────────────────

/// A 6-byte radio hardware address.
///
/// Addresses are plain values: byte-wise equality, copied everywhere, usable
/// as a set/map key and as a send destination.  There is no ownership or
/// lifetime attached to an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerAddress(pub [u8; 6]);

/// The all-ones broadcast address.  Every device in radio range receives
/// frames sent here; no peer registration is required for broadcast sends.
pub const BROADCAST: PeerAddress = PeerAddress([0xFF; 6]);

impl PeerAddress {
    /// Returns `true` if this is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == BROADCAST
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Error returned when parsing a textual peer address fails.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid peer address {input:?}: expected aa:bb:cc:dd:ee:ff")]
pub struct AddressParseError {
    /// The string that failed to parse.
    pub input: String,
}

impl FromStr for PeerAddress {
    type Err = AddressParseError;

    /// Parses the colon-separated hex form, e.g. `"24:6f:28:ab:cd:ef"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || AddressParseError {
            input: s.to_string(),
        };
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for slot in bytes.iter_mut() {
            let part = parts.next().ok_or_else(err)?;
            if part.len() != 2 {
                return Err(err());
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| err())?;
        }
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(PeerAddress(bytes))
    }
}

// ── Tick snapshots ────────────────────────────────────────────────────────────

/// One device's authoritative view of the match state for a single tick.
///
/// Sent unicast to the peer once per game-loop tick while a match is live.
/// The wire layout is fixed (see [`SNAPSHOT_SIZE`]): both ends must agree on
/// field order and width, so the codec writes fields exactly in declaration
/// order, big-endian, with `scored` as a single flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSnapshot {
    /// Monotonic tick counter of the sending device at build time.
    pub tick_count: u32,
    /// Whether the sender's simulation registered a goal this tick.
    pub scored: bool,
    /// The sender's own (near) paddle position, in its coordinate frame.
    pub paddle_pos: i32,
    /// Ball centre X in the sender's coordinate frame.
    pub ball_x: i32,
    /// Ball centre Y in the sender's coordinate frame.
    pub ball_y: i32,
    /// Ball X velocity in the sender's coordinate frame.
    pub ball_speed_x: i32,
    /// Ball Y velocity in the sender's coordinate frame.
    pub ball_speed_y: i32,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All valid Airpong link frames, discriminated by length and prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMessage {
    /// `D` (broadcast): probe for joinable peers.
    DiscoveryProbe,
    /// `A D` (unicast): "I am here and joinable", answering a probe.
    DiscoveryAck,
    /// `J` (unicast): ask a discovered peer to start a match.
    JoinRequest,
    /// `A J` (unicast): the request arrived and is awaiting the operator.
    JoinAck,
    /// `A J A` (unicast): the operator accepted; the match starts.
    JoinAccept,
    /// `A J D` (unicast): the operator declined.
    JoinDecline,
    /// Raw snapshot bytes: in-match state update.
    Tick(TickSnapshot),
}

impl LinkMessage {
    /// Returns the tag-byte sequence identifying this frame on the wire,
    /// or `None` for snapshot frames (identified by length alone).
    pub fn tag(&self) -> Option<&'static [u8]> {
        match self {
            LinkMessage::DiscoveryProbe => Some(&[TAG_DISCOVERY]),
            LinkMessage::DiscoveryAck => Some(&[TAG_ACK, TAG_DISCOVERY]),
            LinkMessage::JoinRequest => Some(&[TAG_JOIN]),
            LinkMessage::JoinAck => Some(&[TAG_ACK, TAG_JOIN]),
            LinkMessage::JoinAccept => Some(&[TAG_ACK, TAG_JOIN, TAG_ACK]),
            LinkMessage::JoinDecline => Some(&[TAG_ACK, TAG_JOIN, TAG_DISCOVERY]),
            LinkMessage::Tick(_) => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
