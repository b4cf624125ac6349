//! Negotiation bounded context - drives the offer/answer exchange between
//! two endpoints

pub mod candidate;
pub mod endpoint;
pub mod event;
pub mod media;
pub mod observer;
pub mod session;
pub mod signaling;
pub mod value_object;

pub use candidate::{CandidateType, IceCandidate};
pub use endpoint::Endpoint;
pub use event::NegotiationEvent;
pub use media::{MediaHandle, MediaKind, MediaSource, MediaTrack};
pub use observer::NegotiationObserver;
pub use session::NegotiationSession;
pub use signaling::{ReceiveHandler, SignalingChannel, SignalingMessage};
pub use value_object::{
    ConnectivityState, EndpointRole, MediaConstraints, SdpKind, SessionDescription, SignalingState,
};
