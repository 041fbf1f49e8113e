//! The join handshake: radio-side actions for both ends of the exchange.
//!
//! The full handshake is four steps between an initiator (the future
//! Guest) and a responder (the future Host):
//!
//! ```text
//! Guest                         Host
//!   │ ── J ──────────────────────▶ │   request
//!   │ ◀────────────────────── AJ ─ │   acknowledged, operator deciding
//!   │ ◀── AJA ──── or ──── AJD ──  │   accepted / declined
//! ```
//!
//! This component performs the sends and the peer-table bookkeeping for
//! each step; deciding *when* each step happens is the session state
//! machine's job.  Exactly one handshake is in flight at a time — a `J`
//! from a different peer while negotiating is answered with
//! [`reject_busy`](JoinCoordinator::reject_busy) so the stray requester is
//! not left waiting.

use airpong_core::{encode_frame, LinkMessage, PeerAddress};
use tracing::{debug, warn};

use crate::infrastructure::radio::{Radio, RadioError};

/// Radio-side driver for the four-step join handshake.
#[derive(Debug, Default)]
pub struct JoinCoordinator;

impl JoinCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Guest step 1: register the chosen peer and unicast a join request.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if registration or the send fails; the caller
    /// stays in its menu state in that case.
    pub fn request(&self, radio: &dyn Radio, peer: PeerAddress) -> Result<(), RadioError> {
        radio.add_peer(peer)?;
        if let Err(e) = radio.send(peer, &encode_frame(&LinkMessage::JoinRequest)) {
            // Failed before the handshake began; drop the registration.
            radio.remove_peer(peer);
            return Err(e);
        }
        debug!("join requested from {peer}");
        Ok(())
    }

    /// Host step 2: acknowledge a join request so the guest knows the
    /// operator is deciding.  The requester stays registered speculatively
    /// until the decision.
    pub fn acknowledge(&self, radio: &dyn Radio, peer: PeerAddress) {
        if let Err(e) = radio.add_peer(peer) {
            warn!("cannot acknowledge join from {peer}: {e}");
            return;
        }
        if let Err(e) = radio.send(peer, &encode_frame(&LinkMessage::JoinAck)) {
            warn!("failed to ack join request from {peer}: {e}");
        }
    }

    /// Host: decline a second request that arrived while another handshake
    /// is negotiating.  Registers only long enough to answer.
    pub fn reject_busy(&self, radio: &dyn Radio, peer: PeerAddress) {
        debug!("rejecting join from {peer}: already negotiating");
        if radio.add_peer(peer).is_err() {
            return;
        }
        if let Err(e) = radio.send(peer, &encode_frame(&LinkMessage::JoinDecline)) {
            warn!("failed to reject join from {peer}: {e}");
        }
        radio.remove_peer(peer);
    }

    /// Host step 4a: the operator accepted.  The peer remains registered
    /// for the match.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if the send fails; the guest will keep
    /// waiting and the operator can retry or cancel.
    pub fn accept(&self, radio: &dyn Radio, peer: PeerAddress) -> Result<(), RadioError> {
        radio.send(peer, &encode_frame(&LinkMessage::JoinAccept))
    }

    /// Host step 4b: the operator declined.  The speculative registration
    /// from [`acknowledge`](Self::acknowledge) is removed.
    pub fn decline(&self, radio: &dyn Radio, peer: PeerAddress) {
        if let Err(e) = radio.send(peer, &encode_frame(&LinkMessage::JoinDecline)) {
            warn!("failed to send decline to {peer}: {e}");
        }
        radio.remove_peer(peer);
    }

    /// Either side: abandon the handshake without notifying the peer.
    /// The peer's own timeout/menu layer handles the silence.
    pub fn abandon(&self, radio: &dyn Radio, peer: PeerAddress) {
        radio.remove_peer(peer);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
