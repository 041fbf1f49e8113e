//! UI event bridge: the narrow surface the menu/display layer consumes.
//!
//! The protocol core never draws.  It pushes [`UiEvent`]s onto a channel
//! and the presentation layer (menu tree + display driver on the device, a
//! log pump in the headless binary) renders them however it likes.  The
//! presentation layer must NOT be imported by the application modules; the
//! channel is the only connection.
//!
//! Events can originate on two contexts: the main loop (discovery results,
//! match lifecycle) and the radio receive callback (an incoming join
//! request).  The callback side uses `try_send` so it never blocks: if the
//! UI queue is momentarily full the event is dropped, which at worst means
//! the operator sees the request on its retransmission.

use airpong_core::PeerAddress;
use tokio::sync::mpsc;

use crate::application::session::Role;

/// Events pushed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The discovered-peer list changed; re-render the join menu.
    DiscoveredPeers(Vec<PeerAddress>),
    /// A peer asked to join; show the accept/decline prompt.
    IncomingJoinRequest(PeerAddress),
    /// Show a transient waiting message (e.g. "Searching for games...").
    Waiting(String),
    /// The peer declined our join request.
    Declined,
    /// The handshake completed and a match is starting.
    MatchStarted(Role),
    /// The match ended or was cancelled; return to the menu.
    MatchEnded,
}

/// Sending half handed to the protocol core.
pub type UiSink = mpsc::Sender<UiEvent>;

/// Creates the UI event channel.
///
/// The queue is small on purpose: UI events are advisory, and the channel
/// must never become a buffer the protocol leans on.
pub fn ui_channel() -> (UiSink, mpsc::Receiver<UiEvent>) {
    mpsc::channel(16)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_order() {
        // Arrange
        let (tx, mut rx) = ui_channel();

        // Act
        tx.try_send(UiEvent::Waiting("Searching for games...".into()))
            .expect("queue has room");
        tx.try_send(UiEvent::Declined).expect("queue has room");

        // Assert
        assert_eq!(
            rx.try_recv().unwrap(),
            UiEvent::Waiting("Searching for games...".into())
        );
        assert_eq!(rx.try_recv().unwrap(), UiEvent::Declined);
    }

    #[test]
    fn test_try_send_on_full_queue_drops_instead_of_blocking() {
        // Arrange — fill the queue.
        let (tx, _rx) = ui_channel();
        while tx.try_send(UiEvent::Declined).is_ok() {}

        // Act / Assert — the callback-side contract: an error, not a block.
        assert!(tx.try_send(UiEvent::Declined).is_err());
    }
}
