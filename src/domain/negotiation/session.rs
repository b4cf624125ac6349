//! Negotiation session aggregate root
//!
//! Binds the two endpoints of one call attempt, enforces the exchange rules
//! and records domain events. At most one active session exists per endpoint
//! pair; the coordinator's registry enforces that invariant.

use crate::domain::negotiation::candidate::IceCandidate;
use crate::domain::negotiation::endpoint::Endpoint;
use crate::domain::negotiation::event::NegotiationEvent;
use crate::domain::negotiation::media::MediaHandle;
use crate::domain::negotiation::value_object::{
    ConnectivityState, EndpointRole, SdpKind, SessionDescription,
};
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::SessionId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct NegotiationSession {
    id: SessionId,
    local: Endpoint,
    remote: Endpoint,
    created_at: DateTime<Utc>,
    connected_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    events: Vec<NegotiationEvent>,
}

impl NegotiationSession {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    /// Rebuild the session under an id received from the peer (the offer
    /// message carries it in the two-process variant)
    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            local: Endpoint::new(EndpointRole::Local),
            remote: Endpoint::new(EndpointRole::Remote),
            created_at: Utc::now(),
            connected_at: None,
            closed_at: None,
            events: Vec::new(),
        }
    }

    /// Attach a live capture to one side
    pub fn attach_media(&mut self, role: EndpointRole, handle: MediaHandle) -> Result<()> {
        self.guard_open()?;
        let labels = handle.track_labels();
        self.endpoint_mut(role).attach_media(handle);
        self.record_event(NegotiationEvent::media_attached(self.id, role, labels));
        Ok(())
    }

    /// Hold a description produced by `role` and record the matching event
    pub fn hold_local_description(
        &mut self,
        role: EndpointRole,
        description: SessionDescription,
    ) -> Result<()> {
        self.guard_open()?;
        let kind = description.kind();
        self.endpoint_mut(role)
            .set_local_description(description.clone())?;
        let event = match kind {
            SdpKind::Offer => NegotiationEvent::offer_created(self.id, role, description),
            SdpKind::Answer => NegotiationEvent::answer_created(self.id, role, description),
        };
        self.record_event(event);
        Ok(())
    }

    /// Hold a description received from the peer of `role`.
    ///
    /// Re-applying an answer after one is already held is a no-op, not an
    /// error; the exchange is already complete.
    pub fn hold_remote_description(
        &mut self,
        role: EndpointRole,
        description: SessionDescription,
    ) -> Result<()> {
        self.guard_open()?;
        description.validate()?;

        let endpoint = self.endpoint_mut(role);
        match description.kind() {
            SdpKind::Offer => {
                endpoint.set_remote_description(description)?;
                self.record_event(NegotiationEvent::offer_accepted(self.id, role));
            }
            SdpKind::Answer => {
                if endpoint.remote_description().is_some() {
                    return Ok(());
                }
                endpoint.set_remote_description(description)?;
                self.record_event(NegotiationEvent::completed(self.id, role));
            }
        }
        Ok(())
    }

    /// Record a locally discovered candidate (`None` is the end-of-gathering
    /// sentinel)
    pub fn record_local_candidate(
        &mut self,
        role: EndpointRole,
        candidate: Option<IceCandidate>,
    ) -> Result<()> {
        self.guard_open()?;
        match candidate {
            Some(candidate) => {
                self.endpoint_mut(role)
                    .record_local_candidate(candidate.clone())?;
                self.record_event(NegotiationEvent::candidate_discovered(
                    self.id, role, candidate,
                ));
            }
            None => {
                if self.endpoint_mut(role).finish_gathering() {
                    self.record_event(NegotiationEvent::gathering_completed(self.id, role));
                }
            }
        }
        Ok(())
    }

    /// Hand a peer-discovered candidate to `role`'s transport
    pub fn apply_remote_candidate(
        &mut self,
        role: EndpointRole,
        candidate: IceCandidate,
    ) -> Result<()> {
        self.guard_open()?;
        self.endpoint_mut(role)
            .apply_remote_candidate(candidate.clone())?;
        self.record_event(NegotiationEvent::candidate_applied(self.id, role, candidate));
        Ok(())
    }

    /// Record a connectivity transition reported by the transport
    pub fn observe_connectivity(
        &mut self,
        role: EndpointRole,
        state: ConnectivityState,
    ) -> Result<()> {
        self.guard_open()?;
        if self.endpoint(role).connectivity_state() == state {
            return Ok(());
        }
        let previous = self.endpoint_mut(role).set_connectivity(state)?;
        self.record_event(NegotiationEvent::connectivity_changed(
            self.id, role, previous, state,
        ));

        if self.connected_at.is_none()
            && self.local.connectivity_state() == ConnectivityState::Connected
            && self.remote.connectivity_state() == ConnectivityState::Connected
        {
            self.connected_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Release both endpoints and mark the session terminal. Idempotent.
    pub fn close(&mut self) {
        if self.closed_at.is_some() {
            return;
        }
        self.local.close();
        self.remote.close();
        self.closed_at = Some(Utc::now());
        self.record_event(NegotiationEvent::torn_down(self.id));
    }

    fn guard_open(&self) -> Result<()> {
        if self.closed_at.is_some() {
            return Err(NegotiationError::SessionClosed(self.id));
        }
        Ok(())
    }

    fn record_event(&mut self, event: NegotiationEvent) {
        self.events.push(event);
    }

    /// Take all pending events, in recording order
    pub fn take_events(&mut self) -> Vec<NegotiationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn endpoint(&self, role: EndpointRole) -> &Endpoint {
        match role {
            EndpointRole::Local => &self.local,
            EndpointRole::Remote => &self.remote,
        }
    }

    fn endpoint_mut(&mut self, role: EndpointRole) -> &mut Endpoint {
        match role {
            EndpointRole::Local => &mut self.local,
            EndpointRole::Remote => &mut self.remote,
        }
    }

    // Getters
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.connected_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    /// Time from session creation to both sides reporting connected
    pub fn setup_time(&self) -> Option<chrono::Duration> {
        self.connected_at.map(|connected| connected - self.created_at)
    }
}

impl Default for NegotiationSession {
    fn default() -> Self {
        Self::new()
    }
}
