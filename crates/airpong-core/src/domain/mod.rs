//! Pure game logic with no OS, display, or radio dependencies.

pub mod physics;

pub use physics::{mirror, snapshot, step, Ball, GameState, Paddle, Scorer};
