//! Cross-thread hand-off primitives shared by the receive path and the
//! main game loop.

pub mod slot;

pub use slot::LatestSlot;
