//! UDP broadcast stand-in for the packet radio.
//!
//! The real device radio is a connectionless broadcast medium addressed by
//! 6-byte hardware addresses.  On a LAN we emulate it with one UDP socket
//! per device, all bound to the same port, every datagram sent to the IPv4
//! broadcast address:
//!
//! ```text
//! [dest:6][src:6][frame:N]
//! ```
//!
//! Receivers drop datagrams whose `dest` is neither their own address nor
//! the all-ones broadcast address, and drop their own loopbacked
//! broadcasts, which leaves exactly the semantics the protocol expects:
//! unicast and broadcast over an unreliable shared medium.
//!
//! The receive loop runs as a blocking loop on a dedicated named thread so
//! the synchronous socket I/O never touches the main game loop.  The
//! socket has a read timeout; on each timeout the loop checks the `running`
//! flag and exits cleanly on shutdown.

use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use airpong_core::PeerAddress;
use tracing::{debug, error, info};

use super::{Radio, RadioError, RadioHandler, MAX_PEERS};

/// Bytes of addressing prefix on every datagram: destination + source.
const ADDR_PREFIX: usize = 12;

/// UDP-backed [`Radio`] implementation.
pub struct UdpRadio {
    socket: UdpSocket,
    local: PeerAddress,
    port: u16,
    peers: Mutex<HashSet<PeerAddress>>,
    handler: Arc<Mutex<Option<RadioHandler>>>,
    running: Arc<AtomicBool>,
}

impl UdpRadio {
    /// Binds the radio socket and spawns the receive thread.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::InitFailed`] if the socket cannot be bound or
    /// configured.  Callers report this upward as a message; it is never a
    /// crash.
    pub fn start(local: PeerAddress, port: u16) -> Result<Arc<Self>, RadioError> {
        let bind_addr = SocketAddr::from(([0, 0, 0, 0], port));
        let socket = UdpSocket::bind(bind_addr)
            .map_err(|e| RadioError::InitFailed(format!("bind {bind_addr}: {e}")))?;
        socket
            .set_broadcast(true)
            .map_err(|e| RadioError::InitFailed(format!("set_broadcast: {e}")))?;
        socket
            .set_read_timeout(Some(Duration::from_millis(500)))
            .map_err(|e| RadioError::InitFailed(format!("set_read_timeout: {e}")))?;

        let radio = Arc::new(Self {
            socket: socket
                .try_clone()
                .map_err(|e| RadioError::InitFailed(format!("clone socket: {e}")))?,
            local,
            port,
            peers: Mutex::new(HashSet::new()),
            handler: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(true)),
        });

        let recv_radio = Arc::clone(&radio);
        std::thread::Builder::new()
            .name("airpong-radio".to_string())
            .spawn(move || {
                recv_loop(socket, recv_radio);
            })
            .map_err(|e| RadioError::InitFailed(format!("spawn receive thread: {e}")))?;

        info!("radio up as {local} on UDP port {port}");
        Ok(radio)
    }

    /// Signals the receive thread to exit after its current timeout.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Radio for UdpRadio {
    fn send(&self, dest: PeerAddress, frame: &[u8]) -> Result<(), RadioError> {
        if !dest.is_broadcast() {
            let peers = self.peers.lock().unwrap_or_else(|e| e.into_inner());
            if !peers.contains(&dest) {
                return Err(RadioError::PeerNotRegistered(dest));
            }
        }

        let mut datagram = Vec::with_capacity(ADDR_PREFIX + frame.len());
        datagram.extend_from_slice(dest.as_bytes());
        datagram.extend_from_slice(self.local.as_bytes());
        datagram.extend_from_slice(frame);

        // Everything goes out as an IP broadcast; addressing is done by the
        // 6-byte prefix, like the air interface it stands in for.
        let target = SocketAddrV4::new(Ipv4Addr::BROADCAST, self.port);
        self.socket
            .send_to(&datagram, target)
            .map_err(|e| RadioError::SendFailed(e.to_string()))?;
        Ok(())
    }

    fn set_handler(&self, handler: RadioHandler) {
        *self.handler.lock().unwrap_or_else(|e| e.into_inner()) = Some(handler);
    }

    fn clear_handler(&self) {
        *self.handler.lock().unwrap_or_else(|e| e.into_inner()) = None;
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
        self.local
    }
}

/// The receive loop executed on the radio thread.
fn recv_loop(socket: UdpSocket, radio: Arc<UdpRadio>) {
    let mut buf = vec![0u8; 1024];

    while radio.running.load(Ordering::Relaxed) {
        let (len, _src_sock) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                error!("radio recv error: {e}");
                continue;
            }
        };

        if len < ADDR_PREFIX {
            debug!("dropping short datagram ({len} bytes)");
            continue;
        }

        let mut dest = [0u8; 6];
        let mut src = [0u8; 6];
        dest.copy_from_slice(&buf[0..6]);
        src.copy_from_slice(&buf[6..12]);
        let dest = PeerAddress(dest);
        let src = PeerAddress(src);

        // Our own broadcasts come back to us; the real radio never hears
        // its own transmissions.
        if src == radio.local {
            continue;
        }
        if dest != radio.local && !dest.is_broadcast() {
            continue;
        }

        // Clone the handler out of the lock before invoking it, so a
        // handler that sends (and thus re-enters the radio) cannot deadlock.
        let handler = radio
            .handler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match handler {
            Some(handler) => handler(src, &buf[ADDR_PREFIX..len]),
            None => debug!("no handler installed; dropping frame from {src}"),
        }
    }

    info!("radio receive loop stopped");
}

/// Returns `true` for OS timeout / would-block errors that should be retried.
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use airpong_core::BROADCAST;

    fn addr(last: u8) -> PeerAddress {
        PeerAddress([0x02, 0, 0, 0, 0, last])
    }

    fn free_port() -> u16 {
        // Bind port 0 and read back the OS-assigned port.
        let probe = UdpSocket::bind("0.0.0.0:0").expect("probe bind");
        let port = probe.local_addr().unwrap().port();
        drop(probe);
        port
    }

    #[test]
    fn test_start_binds_and_reports_local_address() {
        // Arrange / Act
        let radio = UdpRadio::start(addr(1), free_port()).expect("radio must start");

        // Assert
        assert_eq!(radio.local_address(), addr(1));
        radio.shutdown();
    }

    #[test]
    fn test_unicast_to_unregistered_peer_is_rejected() {
        // Arrange
        let radio = UdpRadio::start(addr(2), free_port()).expect("radio must start");

        // Act
        let result = radio.send(addr(9), b"J");

        // Assert
        assert!(matches!(result, Err(RadioError::PeerNotRegistered(_))));
        radio.shutdown();
    }

    #[test]
    fn test_unicast_succeeds_after_registration() {
        let radio = UdpRadio::start(addr(3), free_port()).expect("radio must start");
        radio.add_peer(addr(9)).expect("table has room");

        assert!(radio.send(addr(9), b"J").is_ok());

        radio.remove_peer(addr(9));
        assert!(radio.send(addr(9), b"J").is_err());
        radio.shutdown();
    }

    #[test]
    fn test_broadcast_needs_no_registration() {
        let radio = UdpRadio::start(addr(4), free_port()).expect("radio must start");

        assert!(radio.send(BROADCAST, b"D").is_ok());
        radio.shutdown();
    }

    #[test]
    fn test_peer_table_is_bounded() {
        // Arrange
        let radio = UdpRadio::start(addr(5), free_port()).expect("radio must start");
        for i in 0..MAX_PEERS {
            radio
                .add_peer(PeerAddress([0x04, 0, 0, 0, 0, i as u8]))
                .expect("table has room");
        }

        // Act
        let overflow = radio.add_peer(PeerAddress([0x05, 0, 0, 0, 0, 0]));

        // Assert
        assert!(matches!(overflow, Err(RadioError::PeerTableFull)));
        radio.shutdown();
    }

    #[test]
    fn test_handler_registration_replaces_previous() {
        // The radio holds at most one handler; frame exchange between two
        // endpoints is covered by the loopback transport tests.
        let radio = UdpRadio::start(addr(6), free_port()).expect("radio must start");

        radio.set_handler(Arc::new(|_, _: &[u8]| {}));
        radio.set_handler(Arc::new(|_, _: &[u8]| {}));
        radio.clear_handler();

        assert!(radio
            .handler
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_none());
        radio.shutdown();
    }
}
