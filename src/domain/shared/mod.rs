//! Shared kernel - common types used across the domain

pub mod error;
pub mod events;
pub mod result;
pub mod value_objects;

pub use error::NegotiationError;
pub use result::Result;
pub use value_objects::*;
