//! In-match state synchronization: one snapshot each way per game tick.
//!
//! # The tick sequence
//!
//! Every main-loop tick performs, in order:
//!
//! 1. Take the shared remote slot, waiting at most one tick interval.
//! 2. If a snapshot arrived, run it through the [`TickGate`] and apply it
//!    according to role; otherwise continue on local prediction alone.
//! 3. Run the local deterministic physics step.
//! 4. Build this tick's outgoing snapshot and unicast it to the peer.
//! 5. Increment the local tick counter.
//!
//! A missed or delayed peer packet therefore degrades play smoothly — the
//! loop never stalls past one tick interval.
//!
//! # Role asymmetry
//!
//! Both devices render mirrored views of the same field, each considering
//! itself the near player.  Exactly one side must be the source of truth
//! for the ball or corrections would oscillate, so on applying a validated
//! snapshot the Guest overwrites its ball state and opponent paddle with
//! the mirrored remote values, while the Host applies only the opponent
//! paddle — its own ball simulation stands.  For the same reason the
//! Host's `scored` flag wins: the Guest adopts a goal the Host registered
//! even if its own simulation missed it, and the Host ignores the Guest's
//! flag.

use std::sync::Arc;
use std::time::Duration;

use airpong_core::{
    domain::physics::{self, GameState},
    encode_frame, decode_frame, LinkMessage, LatestSlot, PeerAddress, TickGate, TickSnapshot,
    TickVerdict,
};
use tracing::{debug, trace, warn};

use crate::application::session::Role;
use crate::infrastructure::radio::{Radio, RadioHandler};

/// Drives one side of the in-match snapshot exchange.
pub struct TickExchange {
    role: Role,
    peer: PeerAddress,
    state: GameState,
    gate: TickGate,
    slot: Arc<LatestSlot<TickSnapshot>>,
    tick_interval: Duration,
    tick_count: u32,
    /// Whether the previous local step registered a goal; feeds the
    /// outgoing `scored` flag and the guest-side tie-break.
    scored_last_step: bool,
}

impl TickExchange {
    /// Creates the exchange for a freshly established session.
    pub fn new(
        role: Role,
        peer: PeerAddress,
        slot: Arc<LatestSlot<TickSnapshot>>,
        tick_interval: Duration,
    ) -> Self {
        slot.clear();
        Self {
            role,
            peer,
            state: GameState::new(),
            gate: TickGate::new(),
            slot,
            tick_interval,
            tick_count: 0,
            scored_last_step: false,
        }
    }

    /// The in-match receive handler: decodes snapshot frames from the
    /// session peer into the shared slot, latest-wins.  Runs on the radio's
    /// receive context and touches nothing but the slot.
    pub fn handler(slot: Arc<LatestSlot<TickSnapshot>>, peer: PeerAddress) -> RadioHandler {
        Arc::new(move |src, frame: &[u8]| {
            if src != peer {
                trace!("ignoring in-match frame from non-peer {src}");
                return;
            }
            match decode_frame(frame) {
                Ok(LinkMessage::Tick(snapshot)) => slot.store(snapshot),
                Ok(other) => trace!("ignoring non-snapshot frame in match: {other:?}"),
                Err(e) => debug!("dropping malformed frame from {src}: {e}"),
            }
        })
    }

    /// Runs one full tick of the exchange (steps 1–5 above).
    pub fn tick(&mut self, radio: &dyn Radio) {
        // (1) Bounded wait for the peer's snapshot.
        match self.slot.take_within(self.tick_interval) {
            // (2) Validate and apply, or fall back to local prediction.
            Some(remote) => match self.gate.evaluate(remote.tick_count, self.tick_count) {
                TickVerdict::Apply => self.apply_remote(&remote),
                TickVerdict::Stale => {
                    trace!("discarding stale snapshot (tick {})", remote.tick_count)
                }
                TickVerdict::OutOfStep => debug!(
                    "discarding out-of-step snapshot (remote {}, local {})",
                    remote.tick_count, self.tick_count
                ),
            },
            None => trace!("no snapshot for tick {}; predicting locally", self.tick_count),
        }

        // (3) Local deterministic physics step.
        let scorer = physics::step(&mut self.state);
        self.scored_last_step = scorer.is_some();

        // (4) Send this tick's state.  A rejected send is a no-op: the
        // next tick's snapshot supersedes it.
        let outgoing = physics::snapshot(&self.state, self.tick_count, self.scored_last_step);
        let frame = encode_frame(&LinkMessage::Tick(outgoing));
        if let Err(e) = radio.send(self.peer, &frame) {
            warn!("snapshot send failed on tick {}: {e}", self.tick_count);
        }

        // (5) Advance the local counter.
        self.tick_count += 1;
    }

    /// Applies a gate-validated remote snapshot according to role.
    fn apply_remote(&mut self, remote: &TickSnapshot) {
        let local = physics::mirror(remote);

        // Both roles trust the peer about its own paddle.
        self.state.far_paddle.set_pos(local.paddle_pos);

        if self.role == Role::Host {
            // Host is authoritative: no ball or score corrections from the
            // guest.
            return;
        }

        // Guest: the host's ball state overwrites ours.
        self.state.ball.x = local.ball_x;
        self.state.ball.y = local.ball_y;
        self.state.ball.speed_x = local.ball_speed_x;
        self.state.ball.speed_y = local.ball_speed_y;

        // Host's scored flag wins: adopt a goal our own simulation missed.
        // The mirrored serve direction says who conceded — the serve
        // travels toward the conceding side.
        if remote.scored && !self.scored_last_step {
            debug!("adopting host-registered goal at tick {}", remote.tick_count);
            if local.ball_speed_y > 0 {
                self.state.far_score += 1;
            } else {
                self.state.near_score += 1;
            }
            self.state.near_paddle = physics::Paddle::centered();
        }
    }

    /// Current local match state, for rendering.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The local tick counter.
    pub fn local_tick(&self) -> u32 {
        self.tick_count
    }

    /// Counter of the last applied remote snapshot, for diagnostics.
    pub fn last_applied_remote(&self) -> Option<u32> {
        self.gate.last_applied()
    }

    /// Moves this device's paddle, driven by the input layer.
    pub fn slide_paddle(&mut self, direction: i32) {
        self.state.near_paddle.slide(direction);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::radio::loopback::LoopbackRadio;
    use airpong_core::{FIELD_HEIGHT, FIELD_WIDTH};

    fn addr(last: u8) -> PeerAddress {
        PeerAddress([0x02, 0, 0, 0, 0, last])
    }

    const TICK: Duration = Duration::from_millis(5);

    /// An exchange wired to a loopback radio whose peer end just swallows
    /// frames.
    fn exchange_with_radio(role: Role) -> (TickExchange, Arc<LoopbackRadio>) {
        let (radio, peer_radio) = LoopbackRadio::pair(addr(1), addr(2));
        peer_radio.set_handler(Arc::new(|_, _: &[u8]| {}));
        radio.add_peer(addr(2)).expect("table has room");
        let slot = Arc::new(LatestSlot::new());
        let exchange = TickExchange::new(role, addr(2), slot, TICK);
        (exchange, radio)
    }

    fn remote_snapshot(tick_count: u32) -> TickSnapshot {
        TickSnapshot {
            tick_count,
            scored: false,
            paddle_pos: 40,
            ball_x: 10,
            ball_y: 20,
            ball_speed_x: 2,
            ball_speed_y: -3,
        }
    }

    #[test]
    fn test_tick_sends_snapshot_and_increments_counter() {
        // Arrange — collect what the exchange sends at the peer end.
        let (radio, peer_radio) = LoopbackRadio::pair(addr(1), addr(2));
        let (tx, rx) = std::sync::mpsc::channel();
        peer_radio.set_handler(Arc::new(move |_, frame: &[u8]| {
            let _ = tx.send(decode_frame(frame));
        }));
        radio.add_peer(addr(2)).expect("table has room");
        let slot = Arc::new(LatestSlot::new());
        let mut exchange = TickExchange::new(Role::Host, addr(2), slot, TICK);

        // Act
        exchange.tick(radio.as_ref());
        exchange.tick(radio.as_ref());

        // Assert — two snapshots with consecutive counters.
        match rx.try_recv().expect("frame 0") {
            Ok(LinkMessage::Tick(s)) => assert_eq!(s.tick_count, 0),
            other => panic!("expected snapshot, got {other:?}"),
        }
        match rx.try_recv().expect("frame 1") {
            Ok(LinkMessage::Tick(s)) => assert_eq!(s.tick_count, 1),
            other => panic!("expected snapshot, got {other:?}"),
        }
        assert_eq!(exchange.local_tick(), 2);
    }

    #[test]
    fn test_guest_applies_mirrored_ball_state() {
        // Arrange — guest at local tick 1; remote tick 0 is in lock-step.
        let (mut exchange, radio) = exchange_with_radio(Role::Guest);
        exchange.tick(radio.as_ref()); // advance to local tick 1
        exchange.slot.store(remote_snapshot(0));

        // Act
        exchange.tick(radio.as_ref());

        // Assert — the worked mirroring example, then one local step
        // applied on top of the corrected state.
        let state = exchange.state();
        assert_eq!(state.ball.speed_x, -2);
        assert_eq!(state.ball.speed_y, 3);
        // Corrected position (125, 220) advanced by one step of (-2, 3).
        assert_eq!(state.ball.x, FIELD_WIDTH - 10 - 2);
        assert_eq!(state.ball.y, FIELD_HEIGHT - 20 + 3);
        assert_eq!(state.far_paddle.pos(), FIELD_WIDTH - 40);
        assert_eq!(exchange.last_applied_remote(), Some(0));
    }

    #[test]
    fn test_host_keeps_its_own_ball_state() {
        // Arrange
        let (mut exchange, radio) = exchange_with_radio(Role::Host);
        exchange.tick(radio.as_ref());
        let ball_before = exchange.state().ball;
        exchange.slot.store(remote_snapshot(0));

        // Act
        exchange.tick(radio.as_ref());

        // Assert — opponent paddle updated, ball untouched by the guest.
        assert_eq!(exchange.state().far_paddle.pos(), FIELD_WIDTH - 40);
        assert_eq!(exchange.state().ball.speed_x, ball_before.speed_x);
        assert_eq!(exchange.state().ball.speed_y, ball_before.speed_y);
    }

    #[test]
    fn test_stale_snapshot_is_never_reapplied() {
        // Arrange — apply remote tick 0 normally.
        let (mut exchange, radio) = exchange_with_radio(Role::Guest);
        exchange.tick(radio.as_ref());
        exchange.slot.store(remote_snapshot(0));
        exchange.tick(radio.as_ref());
        let applied = exchange.last_applied_remote();

        // Act — the same packet again, delayed.
        exchange.slot.store(remote_snapshot(0));
        exchange.tick(radio.as_ref());

        // Assert — discarded without side effects on the applied counter.
        assert_eq!(exchange.last_applied_remote(), applied);
    }

    #[test]
    fn test_missing_snapshot_falls_back_to_local_prediction() {
        // Arrange — empty slot throughout.
        let (mut exchange, radio) = exchange_with_radio(Role::Guest);

        // Act — three ticks with no peer input.
        for _ in 0..3 {
            exchange.tick(radio.as_ref());
        }

        // Assert — the loop advanced regardless.
        assert_eq!(exchange.local_tick(), 3);
        assert_eq!(exchange.last_applied_remote(), None);
    }

    #[test]
    fn test_guest_adopts_host_goal_it_missed() {
        // Arrange — guest at local tick 1; host reports a goal with a
        // serve moving toward the guest's near edge after mirroring
        // (host frame speed_y = -2 ⇒ guest frame +2 ⇒ guest conceded).
        let (mut exchange, radio) = exchange_with_radio(Role::Guest);
        exchange.tick(radio.as_ref());
        exchange.slot.store(TickSnapshot {
            tick_count: 0,
            scored: true,
            paddle_pos: FIELD_WIDTH / 2,
            ball_x: FIELD_WIDTH / 2,
            ball_y: FIELD_HEIGHT / 2,
            ball_speed_x: 0,
            ball_speed_y: -2,
        });

        // Act
        exchange.tick(radio.as_ref());

        // Assert
        assert_eq!(exchange.state().far_score, 1);
        assert_eq!(exchange.state().near_score, 0);
    }

    #[test]
    fn test_slide_paddle_moves_near_paddle() {
        let (mut exchange, _radio) = exchange_with_radio(Role::Guest);
        let start = exchange.state().near_paddle.pos();

        exchange.slide_paddle(1);

        assert!(exchange.state().near_paddle.pos() > start);
    }
}
