//! Endpoint entity

use crate::domain::negotiation::candidate::IceCandidate;
use crate::domain::negotiation::media::MediaHandle;
use crate::domain::negotiation::value_object::{
    ConnectivityState, EndpointRole, SdpKind, SessionDescription, SignalingState,
};
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::EndpointId;

/// One side of a potential connection.
///
/// The endpoint exclusively owns its description and candidate buffers; the
/// session aggregate is the only writer. Both descriptions are immutable once
/// held.
#[derive(Debug, Clone)]
pub struct Endpoint {
    id: EndpointId,
    role: EndpointRole,
    signaling_state: SignalingState,
    connectivity_state: ConnectivityState,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    local_candidates: Vec<IceCandidate>,
    remote_candidates: Vec<IceCandidate>,
    gathering_complete: bool,
    media: Option<MediaHandle>,
}

impl Endpoint {
    pub fn new(role: EndpointRole) -> Self {
        Self {
            id: EndpointId::new(),
            role,
            signaling_state: SignalingState::Stable,
            connectivity_state: ConnectivityState::New,
            local_description: None,
            remote_description: None,
            local_candidates: Vec::new(),
            remote_candidates: Vec::new(),
            gathering_complete: false,
            media: None,
        }
    }

    /// Attach a live capture. The handle is shared read-only; track
    /// lifecycle stays with the Media Source.
    pub fn attach_media(&mut self, handle: MediaHandle) {
        self.media = Some(handle);
    }

    /// Hold a description this endpoint produced
    pub fn set_local_description(&mut self, description: SessionDescription) -> Result<()> {
        let target = match description.kind() {
            SdpKind::Offer => SignalingState::HaveLocalOffer,
            SdpKind::Answer => SignalingState::Stable,
        };
        // An answer is only legal while holding the peer's offer
        if description.kind() == SdpKind::Answer
            && self.signaling_state != SignalingState::HaveRemoteOffer
        {
            return Err(self.transition_error(&target));
        }
        self.transition_to(target)?;
        self.local_description = Some(description);
        Ok(())
    }

    /// Hold a description received from the peer
    pub fn set_remote_description(&mut self, description: SessionDescription) -> Result<()> {
        let target = match description.kind() {
            SdpKind::Offer => SignalingState::HaveRemoteOffer,
            SdpKind::Answer => SignalingState::Stable,
        };
        if description.kind() == SdpKind::Answer
            && self.signaling_state != SignalingState::HaveLocalOffer
        {
            return Err(self.transition_error(&target));
        }
        self.transition_to(target)?;
        self.remote_description = Some(description);
        Ok(())
    }

    /// Buffer a locally discovered candidate. Gathering only runs after the
    /// local description is set, and stops at the end-of-gathering sentinel.
    pub fn record_local_candidate(&mut self, candidate: IceCandidate) -> Result<()> {
        if self.local_description.is_none() {
            return Err(NegotiationError::InvalidSignalingState(
                "candidate discovered before the local description was set".to_string(),
            ));
        }
        if self.gathering_complete {
            return Err(NegotiationError::InvalidSignalingState(
                "candidate discovered after end-of-gathering".to_string(),
            ));
        }
        self.local_candidates.push(candidate);
        Ok(())
    }

    /// Mark end-of-gathering. Returns false when already marked.
    pub fn finish_gathering(&mut self) -> bool {
        !std::mem::replace(&mut self.gathering_complete, true)
    }

    /// Hand a peer-discovered candidate to the transport
    pub fn apply_remote_candidate(&mut self, candidate: IceCandidate) -> Result<()> {
        if self.remote_description.is_none() {
            return Err(NegotiationError::PrematureCandidate);
        }
        self.remote_candidates.push(candidate);
        Ok(())
    }

    /// Record a connectivity transition reported by the transport.
    /// Returns the previous state.
    pub fn set_connectivity(&mut self, state: ConnectivityState) -> Result<ConnectivityState> {
        if !self.connectivity_state.can_transition_to(&state) {
            return Err(NegotiationError::InvalidSignalingState(format!(
                "connectivity cannot move from {} to {}",
                self.connectivity_state, state
            )));
        }
        Ok(std::mem::replace(&mut self.connectivity_state, state))
    }

    /// Release transport resources and clear all buffers. Returns false when
    /// already closed.
    pub fn close(&mut self) -> bool {
        if self.signaling_state.is_terminal() {
            return false;
        }
        self.signaling_state = SignalingState::Closed;
        self.connectivity_state = ConnectivityState::Closed;
        self.local_description = None;
        self.remote_description = None;
        self.local_candidates.clear();
        self.remote_candidates.clear();
        self.gathering_complete = false;
        self.media = None;
        true
    }

    fn transition_to(&mut self, new_state: SignalingState) -> Result<()> {
        if !self.signaling_state.can_transition_to(&new_state) {
            return Err(self.transition_error(&new_state));
        }
        self.signaling_state = new_state;
        Ok(())
    }

    fn transition_error(&self, attempted: &SignalingState) -> NegotiationError {
        NegotiationError::InvalidSignalingState(format!(
            "{} endpoint cannot move from {} to {}",
            self.role, self.signaling_state, attempted
        ))
    }

    // Getters
    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn role(&self) -> EndpointRole {
        self.role
    }

    pub fn signaling_state(&self) -> SignalingState {
        self.signaling_state
    }

    pub fn connectivity_state(&self) -> ConnectivityState {
        self.connectivity_state
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn local_candidates(&self) -> &[IceCandidate] {
        &self.local_candidates
    }

    pub fn remote_candidates(&self) -> &[IceCandidate] {
        &self.remote_candidates
    }

    pub fn gathering_complete(&self) -> bool {
        self.gathering_complete
    }

    pub fn media(&self) -> Option<&MediaHandle> {
        self.media.as_ref()
    }

    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }
}
