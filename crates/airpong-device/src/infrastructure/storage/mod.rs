//! On-disk configuration.  Match state itself is never persisted; the
//! session is entirely in-memory and resets on power cycle.

pub mod config;
