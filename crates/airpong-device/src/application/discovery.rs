//! Peer discovery: broadcast a presence probe, collect acknowledgements.
//!
//! Discovery is a single broadcast round: the initiator clears its
//! discovered set, broadcasts `D`, and every peer currently acting as a
//! passive responder answers with a unicast `A D`.  Acknowledgements are
//! collected into a deduplicated set that stays valid until the next
//! [`DiscoveryService::reset_discovered`].
//!
//! There is no timeout in this component: the caller (the menu layer)
//! decides how long to let acknowledgements trickle in before reading the
//! set and re-rendering.

use std::collections::BTreeSet;

use airpong_core::{encode_frame, LinkMessage, PeerAddress, BROADCAST};
use tracing::{debug, warn};

use crate::infrastructure::radio::{Radio, RadioError};

/// Collects and owns the discovered-peer set for one discovery round.
#[derive(Debug, Default)]
pub struct DiscoveryService {
    discovered: BTreeSet<PeerAddress>,
}

impl DiscoveryService {
    /// Creates a service with an empty discovered set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the discovered set for a fresh round.
    pub fn reset_discovered(&mut self) {
        self.discovered.clear();
    }

    /// Broadcasts a discovery probe.  Broadcast needs no peer
    /// registration.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if the driver rejects the frame.
    pub fn probe(&self, radio: &dyn Radio) -> Result<(), RadioError> {
        debug!("broadcasting discovery probe");
        radio.send(BROADCAST, &encode_frame(&LinkMessage::DiscoveryProbe))
    }

    /// Records an acknowledging peer.  Returns `true` if the address was
    /// new, `false` for a duplicate acknowledgement.
    pub fn record_ack(&mut self, peer: PeerAddress) -> bool {
        let added = self.discovered.insert(peer);
        if added {
            debug!("discovered peer {peer}");
        }
        added
    }

    /// The peers discovered so far this round, in stable order.
    pub fn discovered(&self) -> Vec<PeerAddress> {
        self.discovered.iter().copied().collect()
    }

    /// Answers a discovery probe from `src` with a unicast `A D`.
    ///
    /// The prober is registered only long enough to send the ack, then
    /// removed again, so one discovery round cannot leak entries into the
    /// driver's small peer table.
    pub fn answer_probe(radio: &dyn Radio, src: PeerAddress) {
        if let Err(e) = radio.add_peer(src) {
            warn!("cannot answer discovery probe from {src}: {e}");
            return;
        }
        if let Err(e) = radio.send(src, &encode_frame(&LinkMessage::DiscoveryAck)) {
            warn!("failed to ack discovery probe from {src}: {e}");
        }
        radio.remove_peer(src);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
