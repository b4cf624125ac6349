//! Negotiation coordination and simulated transport

pub mod connectivity;
pub mod coordinator;
pub mod gathering;
pub mod sdp;

pub use connectivity::ConnectivityProbe;
pub use coordinator::NegotiationCoordinator;
pub use gathering::CandidateGatherer;
pub use sdp::{build_answer, build_offer, SdpDocument};
