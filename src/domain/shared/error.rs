//! Domain errors

use crate::domain::shared::value_objects::SessionId;
use thiserror::Error;

/// Errors raised while driving an offer/answer negotiation.
///
/// Every variant except `SessionClosed` is recoverable at the session level:
/// the coordinator reports it to the observer and leaves the session in its
/// last stable state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NegotiationError {
    #[error("no live media source attached to the local endpoint")]
    NoMediaSource,

    #[error("malformed session description: {0}")]
    MalformedDescription(String),

    #[error("invalid signaling state: {0}")]
    InvalidSignalingState(String),

    #[error("invalid candidate: {0}")]
    InvalidCandidate(String),

    #[error("candidate received before the remote description was set")]
    PrematureCandidate,

    #[error("no capture device satisfies the requested constraints")]
    NoDevice,

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("an active session already exists for this endpoint pair: {0}")]
    SessionAlreadyActive(SessionId),

    #[error("session {0} has been torn down")]
    SessionClosed(SessionId),

    #[error("signaling channel unavailable: {0}")]
    ChannelClosed(String),
}
