//! Domain layer - negotiation state machines and rules
//!
//! This layer contains:
//! - Aggregates: consistency boundaries (the negotiation session)
//! - Entities: objects with identity (endpoints)
//! - Value Objects: immutable objects without identity
//! - Ports: Media Source, Signaling Channel and Observer interfaces
//! - Domain Events: things that happened during a negotiation

pub mod negotiation;
pub mod shared;

// Re-export commonly used types
pub use shared::{NegotiationError, Result};
