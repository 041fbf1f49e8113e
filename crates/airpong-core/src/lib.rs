//! # airpong-core
//!
//! Shared library for the Airpong two-device pong link containing the wire
//! codec, tick-ordering validation, the latest-wins hand-off slot, and the
//! deterministic game physics.
//!
//! This crate is used by the device application on both ends of a match.
//! It has zero dependencies on OS APIs, displays, or radio drivers.
//!
//! # Architecture overview (for beginners)
//!
//! Airpong is two handheld devices playing one logical pong match over a
//! short-range packet radio.  There is no server: the two devices find each
//! other by broadcast, agree to play via a small handshake, and then each
//! simulates the match locally, exchanging one state snapshot per game tick
//! to stay in agreement.
//!
//! This crate (`airpong-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How bytes travel over the radio.  Every frame is
//!   either a short tag sequence (discovery and join handshake) or a
//!   fixed-layout 25-byte state snapshot, decoded purely by length and
//!   prefix.  The `ordering` submodule decides which received snapshots may
//!   be applied and which are stale duplicates.
//!
//! - **`sync`** – The single cross-thread hand-off structure: a one-slot,
//!   latest-wins cell the radio receive callback writes into and the main
//!   game loop takes from under a bounded wait.
//!
//! - **`domain`** – Pure integer pong physics with no OS dependencies:
//!   one deterministic `step` per tick, plus the coordinate `mirror` that
//!   maps the peer's view of the field into ours.

// Declare the three top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/protocol/mod.rs).
pub mod domain;
pub mod protocol;
pub mod sync;

// Re-export the most-used types at the crate root so callers can write
// `airpong_core::PeerAddress` instead of the full module path.
pub use domain::physics::{GameState, Scorer, FIELD_HEIGHT, FIELD_WIDTH};
pub use protocol::codec::{decode_frame, encode_frame, FrameError};
pub use protocol::messages::{LinkMessage, PeerAddress, TickSnapshot, BROADCAST};
pub use protocol::ordering::{TickGate, TickVerdict};
pub use sync::slot::LatestSlot;
