//! In-memory radio pair for tests.
//!
//! [`LoopbackRadio::pair`] creates two endpoints wired directly to each
//! other.  A send delivers the frame into the peer endpoint's current
//! handler on the calling thread, which from the receiving endpoint's point
//! of view is exactly what the real driver does: its handler fires on a
//! context that is not its own main loop.
//!
//! `drop_next()` arms a one-shot packet loss on the sending side, letting
//! scenario tests exercise the local-prediction fallback without real
//! radios.

use std::collections::HashSet;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use airpong_core::PeerAddress;

use super::{Radio, RadioError, RadioHandler, MAX_PEERS};

/// One endpoint's shared half: its address and its handler slot.
struct Endpoint {
    addr: PeerAddress,
    handler: Mutex<Option<RadioHandler>>,
}

/// In-memory [`Radio`] implementation; always constructed as a pair.
pub struct LoopbackRadio {
    local: Arc<Endpoint>,
    remote: Arc<Endpoint>,
    peers: Mutex<HashSet<PeerAddress>>,
    drop_next: AtomicBool,
}

impl LoopbackRadio {
    /// Creates two endpoints wired to each other.
    pub fn pair(a: PeerAddress, b: PeerAddress) -> (Arc<Self>, Arc<Self>) {
        let end_a = Arc::new(Endpoint {
            addr: a,
            handler: Mutex::new(None),
        });
        let end_b = Arc::new(Endpoint {
            addr: b,
            handler: Mutex::new(None),
        });
        let radio_a = Arc::new(Self {
            local: Arc::clone(&end_a),
            remote: Arc::clone(&end_b),
            peers: Mutex::new(HashSet::new()),
            drop_next: AtomicBool::new(false),
        });
        let radio_b = Arc::new(Self {
            local: end_b,
            remote: end_a,
            peers: Mutex::new(HashSet::new()),
            drop_next: AtomicBool::new(false),
        });
        (radio_a, radio_b)
    }

    /// Arms a one-shot loss: the next send from this endpoint vanishes in
    /// the air (the driver still reports success).
    pub fn drop_next(&self) {
        self.drop_next.store(true, Ordering::Relaxed);
    }
}

impl Radio for LoopbackRadio {
    fn send(&self, dest: PeerAddress, frame: &[u8]) -> Result<(), RadioError> {
        if !dest.is_broadcast() {
            let peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
            if !peers.contains(&dest) {
                return Err(RadioError::PeerNotRegistered(dest));
            }
        }

        // Fire-and-forget: a lost frame is still a successful send.
        if self.drop_next.swap(false, Ordering::Relaxed) {
            return Ok(());
        }
        if dest != self.remote.addr && !dest.is_broadcast() {
            return Ok(());
        }

        // Clone the handler out of the lock before invoking it, so a
        // handler that answers (and thus re-enters the pair) cannot
        // deadlock.
        let handler = self
            .remote
            .handler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(handler) = handler {
            handler(self.local.addr, frame);
        }
        Ok(())
    }

    fn set_handler(&self, handler: RadioHandler) {
        *self.local.handler.lock().unwrap_or_else(|e| e.into_inner()) = Some(handler);
    }

    fn clear_handler(&self) {
        *self.local.handler.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn add_peer(&self, peer: PeerAddress) -> Result<(), RadioError> {
        let mut peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
        if peers.len() >= MAX_PEERS && !peers.contains(&peer) {
            return Err(RadioError::PeerTableFull);
        }
        peers.insert(peer);
        Ok(())
    }

    fn remove_peer(&self, peer: PeerAddress) {
        self.peers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&peer);
    }

    fn local_address(&self) -> PeerAddress {
        self.local.addr
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use airpong_core::BROADCAST;
    use std::sync::mpsc;

    fn addr(last: u8) -> PeerAddress {
        PeerAddress([0x02, 0, 0, 0, 0, last])
    }

    fn collecting_handler() -> (RadioHandler, mpsc::Receiver<(PeerAddress, Vec<u8>)>) {
        let (tx, rx) = mpsc::channel();
        let handler: RadioHandler = Arc::new(move |src, frame: &[u8]| {
            let _ = tx.send((src, frame.to_vec()));
        });
        (handler, rx)
    }

    #[test]
    fn test_broadcast_reaches_the_peer_without_registration() {
        // Arrange
        let (a, b) = LoopbackRadio::pair(addr(1), addr(2));
        let (handler, rx) = collecting_handler();
        b.set_handler(handler);

        // Act
        a.send(BROADCAST, b"D").expect("broadcast must succeed");

        // Assert
        let (src, frame) = rx.try_recv().expect("frame must arrive");
        assert_eq!(src, addr(1));
        assert_eq!(frame, b"D".to_vec());
    }

    #[test]
    fn test_unicast_requires_registration() {
        let (a, b) = LoopbackRadio::pair(addr(1), addr(2));
        let (handler, rx) = collecting_handler();
        b.set_handler(handler);

        assert!(matches!(
            a.send(addr(2), b"J"),
            Err(RadioError::PeerNotRegistered(_))
        ));

        a.add_peer(addr(2)).expect("table has room");
        a.send(addr(2), b"J").expect("send must succeed");
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_new_handler_replaces_previous() {
        // Arrange — install a first handler, then replace it.
        let (a, b) = LoopbackRadio::pair(addr(1), addr(2));
        let (old_handler, old_rx) = collecting_handler();
        let (new_handler, new_rx) = collecting_handler();
        b.set_handler(old_handler);
        b.set_handler(new_handler);

        // Act
        a.send(BROADCAST, b"D").expect("broadcast must succeed");

        // Assert — only the replacement sees the frame.
        assert!(old_rx.try_recv().is_err());
        assert!(new_rx.try_recv().is_ok());
    }

    #[test]
    fn test_cleared_handler_drops_frames() {
        let (a, b) = LoopbackRadio::pair(addr(1), addr(2));
        let (handler, rx) = collecting_handler();
        b.set_handler(handler);
        b.clear_handler();

        a.send(BROADCAST, b"D").expect("broadcast must succeed");

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_next_loses_exactly_one_frame() {
        // Arrange
        let (a, b) = LoopbackRadio::pair(addr(1), addr(2));
        let (handler, rx) = collecting_handler();
        b.set_handler(handler);
        a.drop_next();

        // Act — first send vanishes, second arrives.
        a.send(BROADCAST, b"D").expect("lost frame still reports success");
        a.send(BROADCAST, b"D").expect("send must succeed");

        // Assert
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "exactly one frame must arrive");
    }

    #[test]
    fn test_handler_may_answer_within_delivery() {
        // The passive discovery responder answers a probe from inside its
        // handler; the pair must support that re-entrancy.
        let (a, b) = LoopbackRadio::pair(addr(1), addr(2));
        let (probe_handler, probe_rx) = collecting_handler();
        a.set_handler(probe_handler);

        let responder = Arc::clone(&b);
        b.set_handler(Arc::new(move |src, _frame: &[u8]| {
            responder.add_peer(src).expect("table has room");
            responder.send(src, b"AD").expect("answer must succeed");
            responder.remove_peer(src);
        }));

        a.send(BROADCAST, b"D").expect("broadcast must succeed");

        let (src, frame) = probe_rx.try_recv().expect("answer must arrive");
        assert_eq!(src, addr(2));
        assert_eq!(frame, b"AD".to_vec());
    }
}
