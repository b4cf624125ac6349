//! Negotiation value objects

use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity tag for the two sides of a session.
///
/// Peers are never told apart by comparing connection objects; the role tag
/// travels with every message and event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointRole {
    Local,
    Remote,
}

impl EndpointRole {
    /// The opposite side of the session
    pub fn peer(&self) -> Self {
        match self {
            EndpointRole::Local => EndpointRole::Remote,
            EndpointRole::Remote => EndpointRole::Local,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRole::Local => "local",
            EndpointRole::Remote => "remote",
        }
    }
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signaling state of a single endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalingState {
    /// No exchange in flight
    Stable,
    /// This endpoint produced an offer and is waiting for the answer
    HaveLocalOffer,
    /// This endpoint holds the peer's offer and owes an answer
    HaveRemoteOffer,
    /// Terminal, reached only through teardown
    Closed,
}

impl SignalingState {
    /// Check if a state transition is valid
    pub fn can_transition_to(&self, new_state: &SignalingState) -> bool {
        use SignalingState::*;

        match (self, new_state) {
            (Stable, HaveLocalOffer) => true,
            (Stable, HaveRemoteOffer) => true,
            (HaveLocalOffer, Stable) => true,
            (HaveRemoteOffer, Stable) => true,

            // Teardown is legal from anywhere
            (_, Closed) => true,

            (Closed, _) => false,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SignalingState::Closed)
    }
}

impl fmt::Display for SignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalingState::Stable => "stable",
            SignalingState::HaveLocalOffer => "have-local-offer",
            SignalingState::HaveRemoteOffer => "have-remote-offer",
            SignalingState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Connectivity state of a single endpoint.
///
/// Observed, not driven: the transport reports these and the coordinator only
/// records and logs them. There is no automatic restart of failed checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    New,
    Checking,
    Connected,
    Failed,
    Disconnected,
    Closed,
}

impl ConnectivityState {
    /// Check if a reported transition is one the transport can legally make
    pub fn can_transition_to(&self, new_state: &ConnectivityState) -> bool {
        use ConnectivityState::*;

        match (self, new_state) {
            (New, Checking) => true,
            (Checking, Connected) => true,
            (Checking, Failed) => true,
            (Checking, Disconnected) => true,
            (Connected, Disconnected) => true,
            (Connected, Failed) => true,
            // Checks may resume after an interruption
            (Disconnected, Checking) => true,
            (Failed, Checking) => true,

            (_, Closed) => true,
            (Closed, _) => false,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectivityState::Closed)
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectivityState::New => "new",
            ConnectivityState::Checking => "checking",
            ConnectivityState::Connected => "connected",
            ConnectivityState::Failed => "failed",
            ConnectivityState::Disconnected => "disconnected",
            ConnectivityState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Kind of a session description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdpKind {
    Offer,
    Answer,
}

impl SdpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SdpKind::Offer => "offer",
            SdpKind::Answer => "answer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "offer" => Some(SdpKind::Offer),
            "answer" => Some(SdpKind::Answer),
            _ => None,
        }
    }
}

impl fmt::Display for SdpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opaque negotiated payload produced by one endpoint and consumed
/// verbatim by its peer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    kind: SdpKind,
    sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: String) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp,
        }
    }

    pub fn answer(sdp: String) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp,
        }
    }

    pub fn kind(&self) -> SdpKind {
        self.kind
    }

    pub fn sdp(&self) -> &str {
        &self.sdp
    }

    /// Structural well-formedness check applied before a description is
    /// accepted from the peer. The full section grammar lives in the SDP
    /// parser; this guards the aggregate's invariants.
    pub fn validate(&self) -> Result<()> {
        let mut lines = self.sdp.lines();
        if lines.next() != Some("v=0") {
            return Err(NegotiationError::MalformedDescription(
                "description must start with v=0".to_string(),
            ));
        }
        if !self.sdp.lines().any(|l| l.starts_with("o=")) {
            return Err(NegotiationError::MalformedDescription(
                "missing origin (o=) line".to_string(),
            ));
        }
        if !self.sdp.lines().any(|l| l.starts_with("m=")) {
            return Err(NegotiationError::MalformedDescription(
                "description carries no media section".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize to the flat JSON form used by the manual-exchange variant
    pub fn to_json(&self) -> String {
        // Serialization of a two-field struct cannot fail
        serde_json::to_string(self).expect("description serialization")
    }

    /// Parse the flat JSON form
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| NegotiationError::MalformedDescription(e.to_string()))
    }
}

/// Media kinds requested from the Media Source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl MediaConstraints {
    pub fn video_only() -> Self {
        Self {
            video: true,
            audio: false,
        }
    }

    pub fn audio_only() -> Self {
        Self {
            video: false,
            audio: true,
        }
    }

    pub fn video_and_audio() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }

    /// Constraints that request no media cannot be satisfied by any device
    pub fn is_empty(&self) -> bool {
        !self.video && !self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_signaling_transitions() {
        let stable = SignalingState::Stable;
        assert!(stable.can_transition_to(&SignalingState::HaveLocalOffer));
        assert!(stable.can_transition_to(&SignalingState::HaveRemoteOffer));
        assert!(!stable.can_transition_to(&SignalingState::Stable));

        let offering = SignalingState::HaveLocalOffer;
        assert!(offering.can_transition_to(&SignalingState::Stable));
        assert!(!offering.can_transition_to(&SignalingState::HaveRemoteOffer));
    }

    #[test]
    fn test_closed_is_terminal() {
        let closed = SignalingState::Closed;
        assert!(closed.is_terminal());
        assert!(!closed.can_transition_to(&SignalingState::Stable));
        assert!(SignalingState::HaveLocalOffer.can_transition_to(&SignalingState::Closed));
    }

    #[test]
    fn test_connectivity_transitions() {
        use ConnectivityState::*;
        assert!(New.can_transition_to(&Checking));
        assert!(Checking.can_transition_to(&Connected));
        assert!(Connected.can_transition_to(&Disconnected));
        assert!(Disconnected.can_transition_to(&Checking));
        assert!(!New.can_transition_to(&Connected));
        assert!(!Closed.can_transition_to(&Checking));
    }

    #[test]
    fn test_role_peer() {
        assert_eq!(EndpointRole::Local.peer(), EndpointRole::Remote);
        assert_eq!(EndpointRole::Remote.peer(), EndpointRole::Local);
    }

    #[test]
    fn test_description_validation() {
        let good = SessionDescription::offer(
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=x\r\nt=0 0\r\nm=video 9 RTP/AVPF 96\r\n"
                .replace("\r\n", "\n"),
        );
        assert!(good.validate().is_ok());

        let no_media = SessionDescription::offer("v=0\no=- 1 1 IN IP4 0.0.0.0\ns=x\n".into());
        assert!(matches!(
            no_media.validate(),
            Err(NegotiationError::MalformedDescription(_))
        ));

        let garbage = SessionDescription::offer("not sdp at all".into());
        assert!(garbage.validate().is_err());
    }

    #[test]
    fn test_description_json_round_trip() {
        let desc = SessionDescription::answer("v=0\no=- 1 1 IN IP4 0.0.0.0\nm=audio 9 X 0\n".into());
        let parsed = SessionDescription::from_json(&desc.to_json()).unwrap();
        assert_eq!(parsed, desc);
        assert_eq!(parsed.kind(), SdpKind::Answer);
    }

    #[test]
    fn test_constraints() {
        assert!(MediaConstraints {
            video: false,
            audio: false
        }
        .is_empty());
        assert!(!MediaConstraints::video_only().is_empty());
        assert!(MediaConstraints::video_only().video);
        assert!(!MediaConstraints::video_only().audio);
    }
}
