//! Deterministic integer pong physics.
//!
//! Both devices run this same simulation once per tick and exchange the
//! result, so every rule here must be exactly reproducible from state alone:
//! integer arithmetic only, no randomness, no clocks.  The sync layer treats
//! [`step`] as a black box and transmits its output.
//!
//! Each device considers itself the "near" player: its own paddle is at the
//! bottom of its screen and the opponent's at the top.  The two screens are
//! therefore mirrored views of one field, and [`mirror`] maps a snapshot
//! from the peer's coordinate frame into ours.

use crate::protocol::messages::TickSnapshot;

// ── Field geometry ────────────────────────────────────────────────────────────

/// Field width in pixels (portrait display).
pub const FIELD_WIDTH: i32 = 135;
/// Field height in pixels.
pub const FIELD_HEIGHT: i32 = 240;
/// Ball edge length; the ball is drawn as a square.
pub const BALL_SIZE: i32 = 8;
/// Hard cap on the ball's horizontal velocity after a paddle bounce.
pub const MAX_BALL_SPEED_X: i32 = 5;
/// Vertical serve speed after a goal.
pub const SERVE_SPEED_Y: i32 = 2;
/// Paddle width in pixels.
pub const PADDLE_WIDTH: i32 = 30;
/// Paddle thickness in pixels.
pub const PADDLE_HEIGHT: i32 = 4;
/// Pixels a paddle moves per tick while a button is held.
pub const PADDLE_SPEED: i32 = 3;

// ── State types ───────────────────────────────────────────────────────────────

/// The ball: centre position and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ball {
    pub x: i32,
    pub y: i32,
    pub speed_x: i32,
    pub speed_y: i32,
}

impl Ball {
    /// A ball resting at field centre.
    fn centered() -> Self {
        Self {
            x: FIELD_WIDTH / 2,
            y: FIELD_HEIGHT / 2,
            speed_x: 0,
            speed_y: 0,
        }
    }
}

/// A paddle: horizontal centre position.  Vertical placement is implied by
/// which player owns it (near = bottom edge, far = top edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paddle {
    pos: i32,
}

impl Paddle {
    /// A paddle at field centre.
    pub fn centered() -> Self {
        Self {
            pos: FIELD_WIDTH / 2,
        }
    }

    /// Current centre position.
    pub fn pos(&self) -> i32 {
        self.pos
    }

    /// Sets the centre position, clamped so the paddle stays on the field.
    pub fn set_pos(&mut self, pos: i32) {
        self.pos = if pos - PADDLE_WIDTH / 2 < 0 {
            PADDLE_WIDTH / 2
        } else if pos + PADDLE_WIDTH / 2 > FIELD_WIDTH {
            FIELD_WIDTH - PADDLE_WIDTH / 2 - 1
        } else {
            pos
        };
    }

    /// Moves the paddle by one tick's travel in `direction` (-1, 0, or +1).
    pub fn slide(&mut self, direction: i32) {
        if direction != 0 {
            self.set_pos(self.pos + direction.signum() * PADDLE_SPEED);
        }
    }
}

/// Which player's goal line the ball crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scorer {
    /// This device's player scored (ball left the far edge).
    Near,
    /// The opponent scored (ball left the near edge).
    Far,
}

/// Complete local match state, in this device's coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub ball: Ball,
    /// This device's own paddle, on the near (bottom) edge.
    pub near_paddle: Paddle,
    /// The opponent's paddle, on the far (top) edge.
    pub far_paddle: Paddle,
    pub near_score: u32,
    pub far_score: u32,
}

impl GameState {
    /// Fresh match state: centred ball and paddles, zero scores.
    pub fn new() -> Self {
        Self {
            ball: Ball::centered(),
            near_paddle: Paddle::centered(),
            far_paddle: Paddle::centered(),
            near_score: 0,
            far_score: 0,
        }
    }

    /// Recentres the ball and paddles after a goal; the serve travels
    /// toward the player who conceded so the rally restarts predictably on
    /// both devices.
    fn reset_positions(&mut self, scorer: Scorer) {
        self.ball = Ball::centered();
        self.ball.speed_y = match scorer {
            Scorer::Near => -SERVE_SPEED_Y,
            Scorer::Far => SERVE_SPEED_Y,
        };
        self.near_paddle = Paddle::centered();
        self.far_paddle = Paddle::centered();
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Simulation step ───────────────────────────────────────────────────────────

/// Advances the match by one tick.
///
/// In order: side-wall bounce, goal detection, ball movement, then a paddle
/// bounce check against whichever paddle the ball is travelling toward.
/// On a goal the score is tallied and positions reset for the next rally.
pub fn step(state: &mut GameState) -> Option<Scorer> {
    let ball = &mut state.ball;

    // Side walls reflect horizontal travel.
    if ball.x + BALL_SIZE / 2 >= FIELD_WIDTH || ball.x - BALL_SIZE / 2 < 0 {
        ball.speed_x = -ball.speed_x;
    }

    // Goal lines: past the near (bottom) edge the opponent scores, past the
    // far (top) edge we do.
    if ball.y - BALL_SIZE >= FIELD_HEIGHT {
        state.far_score += 1;
        state.reset_positions(Scorer::Far);
        return Some(Scorer::Far);
    }
    if ball.y + BALL_SIZE <= 0 {
        state.near_score += 1;
        state.reset_positions(Scorer::Near);
        return Some(Scorer::Near);
    }

    ball.x += ball.speed_x;
    ball.y += ball.speed_y;

    // Paddle bounce, only against the paddle the ball is moving toward.
    let deflection = if ball.speed_y > 0 {
        paddle_deflection(ball, &state.near_paddle, true)
    } else {
        paddle_deflection(ball, &state.far_paddle, false)
    };
    if let Some(angle) = deflection {
        ball.speed_x = angle.clamp(-MAX_BALL_SPEED_X, MAX_BALL_SPEED_X);
        ball.speed_y = -ball.speed_y;
    }

    None
}

/// Returns the new horizontal velocity if the ball currently overlaps
/// `paddle`, or `None` if it misses.
///
/// The deflection is proportional to where the ball struck along the paddle
/// face: dead centre returns 0, the outer edges return the maximum.
fn paddle_deflection(ball: &Ball, paddle: &Paddle, near: bool) -> Option<i32> {
    let half_width = PADDLE_WIDTH / 2;
    if ball.x + BALL_SIZE / 2 < paddle.pos - half_width
        || ball.x - BALL_SIZE / 2 > paddle.pos + half_width
    {
        return None;
    }
    if near && ball.y + BALL_SIZE / 2 < FIELD_HEIGHT - PADDLE_HEIGHT {
        return None;
    }
    if !near && ball.y - BALL_SIZE / 2 > PADDLE_HEIGHT {
        return None;
    }
    // Linear remap of the hit offset from [-half_width, half_width] to
    // [-MAX_BALL_SPEED_X, MAX_BALL_SPEED_X].
    let offset = ball.x - paddle.pos;
    Some((offset + half_width) * (2 * MAX_BALL_SPEED_X) / (2 * half_width) - MAX_BALL_SPEED_X)
}

// ── Snapshot construction and mirroring ───────────────────────────────────────

/// Builds this tick's outgoing snapshot from local state.
pub fn snapshot(state: &GameState, tick_count: u32, scored: bool) -> TickSnapshot {
    TickSnapshot {
        tick_count,
        scored,
        paddle_pos: state.near_paddle.pos(),
        ball_x: state.ball.x,
        ball_y: state.ball.y,
        ball_speed_x: state.ball.speed_x,
        ball_speed_y: state.ball.speed_y,
    }
}

/// Maps a snapshot from the peer's coordinate frame into ours.
///
/// The two screens render mirrored views of one field, so positions reflect
/// through the field centre and both velocity components negate.  The tick
/// counter and scored flag pass through unchanged.
pub fn mirror(remote: &TickSnapshot) -> TickSnapshot {
    TickSnapshot {
        tick_count: remote.tick_count,
        scored: remote.scored,
        paddle_pos: FIELD_WIDTH - remote.paddle_pos,
        ball_x: FIELD_WIDTH - remote.ball_x,
        ball_y: FIELD_HEIGHT - remote.ball_y,
        ball_speed_x: -remote.ball_speed_x,
        ball_speed_y: -remote.ball_speed_y,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
