//! Wire protocol: message types, the length+prefix codec, and tick ordering.

pub mod codec;
pub mod messages;
pub mod ordering;

pub use codec::{decode_frame, encode_frame, FrameError};
pub use messages::{LinkMessage, PeerAddress, TickSnapshot};
pub use ordering::{TickGate, TickVerdict};
