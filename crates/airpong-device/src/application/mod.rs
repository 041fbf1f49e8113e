//! Application layer: the protocol components driven by the main loop.
//!
//! [`session::SessionStateMachine`] is the umbrella; it owns a
//! [`discovery::DiscoveryService`], a [`join::JoinCoordinator`], and —
//! while a match is live — a [`tick_exchange::TickExchange`].

pub mod discovery;
pub mod join;
pub mod session;
pub mod tick_exchange;
