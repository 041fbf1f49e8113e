//! The radio transport seam.
//!
//! Everything above this module speaks [`Radio`]: fire-and-forget datagram
//! sends addressed by 6-byte hardware addresses, plus a single swappable
//! receive handler.  The session state machine moves between protocol
//! phases by replacing the handler, so at any moment there is exactly one
//! active interpretation of incoming bytes.
//!
//! Two implementations exist:
//!
//! - [`udp::UdpRadio`] – a LAN stand-in for the packet radio, used by the
//!   device binary.
//! - [`loopback::LoopbackRadio`] – an in-memory pair of endpoints for
//!   tests.
//!
//! # Handler contract
//!
//! The handler runs on the radio's receive context, concurrently with the
//! main game loop.  It must stay short and must not mutate game state
//! directly: received snapshots go through the latest-wins slot, and
//! everything else is forwarded as an event for the main loop to act on.

pub mod loopback;
pub mod udp;

use std::sync::Arc;

use airpong_core::PeerAddress;
use thiserror::Error;

/// Maximum number of peers a radio driver will hold in its peer table.
/// Matches the small fixed table of the real radio hardware.
pub const MAX_PEERS: usize = 20;

/// The receive handler: called with the sender's address and the raw frame
/// bytes for every datagram addressed to this device (or broadcast).
pub type RadioHandler = Arc<dyn Fn(PeerAddress, &[u8]) + Send + Sync>;

/// Error type for radio operations.
///
/// Send failures are not fatal anywhere in the protocol: callers log them
/// and move on, since the next tick's send supersedes a lost one.
#[derive(Debug, Error)]
pub enum RadioError {
    /// The driver could not be initialised (e.g. socket bind failure).
    #[error("radio init failed: {0}")]
    InitFailed(String),

    /// A unicast was attempted to a peer that was never registered.
    #[error("peer {0} is not registered")]
    PeerNotRegistered(PeerAddress),

    /// The driver's peer table is full.
    #[error("peer table full ({MAX_PEERS} entries)")]
    PeerTableFull,

    /// The driver rejected or failed the send.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Abstraction over the broadcast/unicast datagram radio.
pub trait Radio: Send + Sync {
    /// Sends `frame` to `dest`, which may be [`airpong_core::BROADCAST`].
    ///
    /// Fire-and-forget: success means the driver accepted the frame, not
    /// that the peer received it.  Unicast requires the destination to have
    /// been registered via [`add_peer`](Self::add_peer); broadcast does not.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if the driver rejects the frame.  Never
    /// blocks longer than the driver's own timeout.
    fn send(&self, dest: PeerAddress, frame: &[u8]) -> Result<(), RadioError>;

    /// Registers the one active receive handler, replacing any previous
    /// registration.
    fn set_handler(&self, handler: RadioHandler);

    /// Removes the receive handler; subsequent datagrams are dropped.
    fn clear_handler(&self);

    /// Adds `peer` to the driver's peer table, enabling unicast to it.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::PeerTableFull`] if the table is at capacity.
    fn add_peer(&self, peer: PeerAddress) -> Result<(), RadioError>;

    /// Removes `peer` from the peer table.  Removing an absent peer is a
    /// no-op.
    fn remove_peer(&self, peer: PeerAddress);

    /// This device's own hardware address.
    fn local_address(&self) -> PeerAddress;
}
