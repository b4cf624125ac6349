//! Application layer - use-case drivers
//!
//! This layer wires domain aggregates, the coordinator and the ports
//! together: local preview, a call held entirely in one process, and a call
//! negotiated over copy-pasted text.

pub mod local_call;
pub mod manual_call;
pub mod preview;
pub mod router;

pub use local_call::SameProcessCall;
pub use manual_call::{ManualExchangeCall, ManualPeer};
pub use preview::LocalPreview;
pub use router::SignalRouter;
