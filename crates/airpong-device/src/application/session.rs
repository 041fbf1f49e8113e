//! The session state machine: from idle menus to a live match and back.
//!
//! # States
//!
//! ```text
//!            start_discovery            request_join
//!   Idle ────────────────▶ Discovering ─────────────▶ JoinRequesting
//!     │                                                     │ AJ
//!     │ host                                                ▼
//!     └──────▶ HostWaiting ◀─ decline_join ─── AwaitingDecision
//!                   │ J + accept_join                       │ AJA
//!                   └──────────────▶ Playing ◀──────────────┘
//! ```
//!
//! Every transition that changes what incoming bytes mean also swaps the
//! radio's receive handler, so there is never a window where a frame is
//! interpreted under the wrong phase.
//!
//! # Threading (for beginners)
//!
//! The radio handler fires on the receive context, not the main loop.  The
//! handlers installed here therefore do no state mutation at all: they
//! decode the frame and forward a [`LinkEvent`] over a channel (or, while
//! playing, store the snapshot in the latest-wins slot).  The main loop
//! calls [`SessionStateMachine::poll_events`] once per iteration and all
//! transitions happen there, single-threaded.  The one exception is the
//! discovery-probe answer while hosting, which is pure radio work with no
//! state involved and is sent straight from the handler.

use std::sync::{Arc, Weak};
use std::time::Duration;

use airpong_core::{decode_frame, LatestSlot, LinkMessage, PeerAddress, TickSnapshot};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::application::discovery::DiscoveryService;
use crate::application::join::JoinCoordinator;
use crate::application::tick_exchange::TickExchange;
use crate::infrastructure::radio::{Radio, RadioError};
use crate::infrastructure::ui_bridge::{UiEvent, UiSink};

/// Which side of the match this device plays.
///
/// The Host's simulation is authoritative for the ball and the score; the
/// Guest follows it.  Roles are fixed at handshake time: the responder that
/// accepted becomes Host, the requester becomes Guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Guest,
}

/// Protocol phase.  See the module diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// In the menus; radio silent.
    Idle,
    /// Probing for hosts and collecting acknowledgements.
    Discovering,
    /// Sent a join request; waiting for the host's `A J`.
    JoinRequesting { peer: PeerAddress },
    /// Request acknowledged; the host's operator is deciding.
    AwaitingDecision { peer: PeerAddress },
    /// Hosting: answering probes and waiting for a challenger.  `pending`
    /// is the acknowledged requester awaiting this operator's decision.
    HostWaiting { pending: Option<PeerAddress> },
    /// In a match.
    Playing { role: Role, peer: PeerAddress },
}

/// Decoded control frames forwarded from the receive context to the main
/// loop.  Snapshots bypass this channel through the latest-wins slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkEvent {
    DiscoveryAck(PeerAddress),
    JoinRequest(PeerAddress),
    JoinAck(PeerAddress),
    Accepted(PeerAddress),
    Declined(PeerAddress),
}

/// Capacity of the link-event channel.  Control frames are rare; a full
/// queue means the main loop stalled, and dropping is the right failure
/// mode for a protocol built on retransmission-by-menu.
const LINK_EVENT_QUEUE: usize = 32;

/// Owns the whole protocol lifecycle for one device.
pub struct SessionStateMachine {
    radio: Arc<dyn Radio>,
    ui: UiSink,
    discovery: DiscoveryService,
    join: JoinCoordinator,
    slot: Arc<LatestSlot<TickSnapshot>>,
    exchange: Option<TickExchange>,
    link_tx: mpsc::Sender<LinkEvent>,
    link_rx: mpsc::Receiver<LinkEvent>,
    state: SessionState,
    tick_interval: Duration,
}

impl SessionStateMachine {
    pub fn new(radio: Arc<dyn Radio>, ui: UiSink, tick_interval: Duration) -> Self {
        let (link_tx, link_rx) = mpsc::channel(LINK_EVENT_QUEUE);
        Self {
            radio,
            ui,
            discovery: DiscoveryService::new(),
            join: JoinCoordinator::new(),
            slot: Arc::new(LatestSlot::new()),
            exchange: None,
            link_tx,
            link_rx,
            state: SessionState::Idle,
            tick_interval,
        }
    }

    /// Current protocol phase.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Peers discovered in the current round, in stable order.
    pub fn discovered(&self) -> Vec<PeerAddress> {
        self.discovery.discovered()
    }

    /// Local match state while playing, for rendering.
    pub fn game_state(&self) -> Option<&airpong_core::GameState> {
        self.exchange.as_ref().map(TickExchange::state)
    }

    // ── Operator entry points ─────────────────────────────────────────────────

    /// Begins a discovery round: fresh set, probe, collect acks.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if the probe broadcast fails; the device
    /// stays idle in that case.
    pub fn start_discovery(&mut self) -> Result<(), RadioError> {
        self.discovery.reset_discovered();
        self.install_discovery_handler();
        self.discovery.probe(self.radio.as_ref())?;
        self.state = SessionState::Discovering;
        self.push_ui(UiEvent::Waiting("Searching for games...".into()));
        Ok(())
    }

    /// Re-probes without clearing what has already been found; late or
    /// previously missed hosts get another chance to answer.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if the broadcast fails.
    pub fn refresh_discovered(&mut self) -> Result<(), RadioError> {
        if self.state != SessionState::Discovering {
            return Ok(());
        }
        self.discovery.probe(self.radio.as_ref())
    }

    /// Switches to hosting: discoverable, accepting join requests.
    pub fn host(&mut self) {
        self.install_host_handler();
        self.state = SessionState::HostWaiting { pending: None };
        self.push_ui(UiEvent::Waiting("Waiting for a challenger...".into()));
        info!("hosting: waiting for a challenger");
    }

    /// Asks `peer` (picked from the discovered list) for a match.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError`] if the request could not be sent; the device
    /// stays in the discovery menu.
    pub fn request_join(&mut self, peer: PeerAddress) -> Result<(), RadioError> {
        self.install_guest_handler();
        self.join.request(self.radio.as_ref(), peer)?;
        self.state = SessionState::JoinRequesting { peer };
        self.push_ui(UiEvent::Waiting("Requesting to join...".into()));
        Ok(())
    }

    /// Host operator accepted the pending challenger.
    pub fn accept_join(&mut self) {
        let SessionState::HostWaiting {
            pending: Some(peer),
        } = self.state
        else {
            warn!("accept_join with no pending challenger");
            return;
        };
        if let Err(e) = self.join.accept(self.radio.as_ref(), peer) {
            // The challenger keeps waiting; the operator can retry.
            warn!("failed to send accept to {peer}: {e}");
            return;
        }
        self.start_match(Role::Host, peer);
    }

    /// Host operator declined the pending challenger; hosting continues.
    pub fn decline_join(&mut self) {
        let SessionState::HostWaiting {
            pending: Some(peer),
        } = self.state
        else {
            warn!("decline_join with no pending challenger");
            return;
        };
        self.join.decline(self.radio.as_ref(), peer);
        self.state = SessionState::HostWaiting { pending: None };
    }

    /// Backs out of whatever is in progress and returns to idle.  No
    /// farewell frame is sent; the other side's own menus handle silence.
    pub fn cancel(&mut self) {
        match self.state {
            SessionState::Idle => return,
            SessionState::JoinRequesting { peer }
            | SessionState::AwaitingDecision { peer } => {
                self.join.abandon(self.radio.as_ref(), peer);
            }
            SessionState::HostWaiting { pending: Some(peer) } => {
                self.join.abandon(self.radio.as_ref(), peer);
            }
            SessionState::Playing { peer, .. } => {
                self.radio.remove_peer(peer);
                self.exchange = None;
                self.push_ui(UiEvent::MatchEnded);
            }
            SessionState::Discovering | SessionState::HostWaiting { pending: None } => {}
        }
        self.radio.clear_handler();
        self.state = SessionState::Idle;
        info!("session cancelled; back to idle");
    }

    // ── Main-loop driving ─────────────────────────────────────────────────────

    /// Drains forwarded link events and performs the resulting transitions.
    /// Called once per main-loop iteration, before [`tick`](Self::tick).
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.link_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Runs one game tick if a match is live; otherwise a no-op.
    pub fn tick(&mut self) {
        if let Some(exchange) = self.exchange.as_mut() {
            exchange.tick(self.radio.as_ref());
        }
    }

    /// Moves this device's paddle (-1, 0, or +1) if a match is live.
    pub fn slide_paddle(&mut self, direction: i32) {
        if let Some(exchange) = self.exchange.as_mut() {
            exchange.slide_paddle(direction);
        }
    }

    fn handle_event(&mut self, event: LinkEvent) {
        match (self.state, event) {
            (SessionState::Discovering, LinkEvent::DiscoveryAck(src)) => {
                if self.discovery.record_ack(src) {
                    self.push_ui(UiEvent::DiscoveredPeers(self.discovery.discovered()));
                }
            }

            (SessionState::HostWaiting { pending: None }, LinkEvent::JoinRequest(src)) => {
                self.join.acknowledge(self.radio.as_ref(), src);
                self.state = SessionState::HostWaiting { pending: Some(src) };
                self.push_ui(UiEvent::IncomingJoinRequest(src));
            }
            (SessionState::HostWaiting { pending: Some(pending) }, LinkEvent::JoinRequest(src)) => {
                if src == pending {
                    // Retransmission; ack again so the requester keeps waiting.
                    self.join.acknowledge(self.radio.as_ref(), src);
                } else {
                    self.join.reject_busy(self.radio.as_ref(), src);
                }
            }

            (SessionState::JoinRequesting { peer }, LinkEvent::JoinAck(src)) if src == peer => {
                self.state = SessionState::AwaitingDecision { peer };
                self.push_ui(UiEvent::Waiting("Waiting for host decision...".into()));
            }
            // Accept may arrive without the ack if the `A J` was lost.
            (
                SessionState::JoinRequesting { peer } | SessionState::AwaitingDecision { peer },
                LinkEvent::Accepted(src),
            ) if src == peer => {
                self.start_match(Role::Guest, peer);
            }
            (
                SessionState::JoinRequesting { peer } | SessionState::AwaitingDecision { peer },
                LinkEvent::Declined(src),
            ) if src == peer => {
                self.join.abandon(self.radio.as_ref(), peer);
                self.radio.clear_handler();
                self.state = SessionState::Idle;
                self.push_ui(UiEvent::Declined);
                info!("join request declined by {peer}");
            }

            (state, event) => trace!("ignoring {event:?} in {state:?}"),
        }
    }

    fn start_match(&mut self, role: Role, peer: PeerAddress) {
        self.radio
            .set_handler(TickExchange::handler(Arc::clone(&self.slot), peer));
        self.exchange = Some(TickExchange::new(
            role,
            peer,
            Arc::clone(&self.slot),
            self.tick_interval,
        ));
        self.state = SessionState::Playing { role, peer };
        self.push_ui(UiEvent::MatchStarted(role));
        info!("match started as {role:?} against {peer}");
    }

    // ── Handler installation ──────────────────────────────────────────────────

    /// While discovering: forward acks, drop everything else.
    fn install_discovery_handler(&self) {
        let link_tx = self.link_tx.clone();
        self.radio.set_handler(Arc::new(move |src, frame: &[u8]| {
            match decode_frame(frame) {
                Ok(LinkMessage::DiscoveryAck) => {
                    forward(&link_tx, LinkEvent::DiscoveryAck(src));
                }
                Ok(other) => trace!("ignoring {other:?} while discovering"),
                Err(e) => debug!("dropping malformed frame from {src}: {e}"),
            }
        }));
    }

    /// While hosting: answer probes in place, forward join requests.
    fn install_host_handler(&self) {
        let link_tx = self.link_tx.clone();
        // Weak, not Arc: the radio owns this closure, and a strong
        // reference back would keep both alive forever.
        let radio: Weak<dyn Radio> = Arc::downgrade(&self.radio);
        self.radio.set_handler(Arc::new(move |src, frame: &[u8]| {
            match decode_frame(frame) {
                Ok(LinkMessage::DiscoveryProbe) => {
                    if let Some(radio) = radio.upgrade() {
                        DiscoveryService::answer_probe(radio.as_ref(), src);
                    }
                }
                Ok(LinkMessage::JoinRequest) => {
                    forward(&link_tx, LinkEvent::JoinRequest(src));
                }
                Ok(other) => trace!("ignoring {other:?} while hosting"),
                Err(e) => debug!("dropping malformed frame from {src}: {e}"),
            }
        }));
    }

    /// While requesting a join: forward the host's three possible answers.
    fn install_guest_handler(&self) {
        let link_tx = self.link_tx.clone();
        self.radio.set_handler(Arc::new(move |src, frame: &[u8]| {
            match decode_frame(frame) {
                Ok(LinkMessage::JoinAck) => forward(&link_tx, LinkEvent::JoinAck(src)),
                Ok(LinkMessage::JoinAccept) => forward(&link_tx, LinkEvent::Accepted(src)),
                Ok(LinkMessage::JoinDecline) => forward(&link_tx, LinkEvent::Declined(src)),
                Ok(other) => trace!("ignoring {other:?} while joining"),
                Err(e) => debug!("dropping malformed frame from {src}: {e}"),
            }
        }));
    }

    fn push_ui(&self, event: UiEvent) {
        if self.ui.try_send(event).is_err() {
            debug!("UI queue full; event dropped");
        }
    }
}

/// Non-blocking forward from the receive context; a full queue drops.
fn forward(link_tx: &mpsc::Sender<LinkEvent>, event: LinkEvent) {
    if let Err(e) = link_tx.try_send(event) {
        warn!("link event dropped: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
