//! Signaling channel implementations

pub mod copy_paste;
pub mod in_process;

pub use copy_paste::{ExchangeBundle, ManualSignaling};
pub use in_process::{InProcessChannel, LoopbackChannel};
