//! Parley - a peer-to-peer offer/answer negotiation engine
//!
//! Drives the two-phase SDP exchange and continuous candidate exchange
//! between two endpoints until a usable (simulated) transport path is
//! established. Signaling is pluggable: in-process delivery for two
//! endpoints sharing a process, or armored copy-paste text for two
//! processes with no signaling server between them.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::NegotiationError;
pub use domain::shared::result::Result;
