//! Negotiation domain events

use crate::domain::negotiation::candidate::IceCandidate;
use crate::domain::negotiation::value_object::{
    ConnectivityState, EndpointRole, SessionDescription,
};
use crate::domain::shared::events::{DomainEvent, EventMetadata};
use crate::domain::shared::value_objects::SessionId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Base struct for all negotiation events
#[derive(Debug, Clone, Serialize)]
pub struct NegotiationEventBase {
    pub metadata: EventMetadata,
    pub session_id: SessionId,
}

impl NegotiationEventBase {
    fn new(event_type: &'static str, session_id: SessionId) -> Self {
        Self {
            metadata: EventMetadata::new(event_type),
            session_id,
        }
    }
}

/// A media handle was attached to one side
#[derive(Debug, Clone, Serialize)]
pub struct MediaAttached {
    pub base: NegotiationEventBase,
    pub role: EndpointRole,
    pub track_labels: Vec<String>,
}

impl DomainEvent for MediaAttached {
    fn event_type(&self) -> &'static str {
        "negotiation.media_attached"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// The offering side produced and holds its offer
#[derive(Debug, Clone, Serialize)]
pub struct OfferCreated {
    pub base: NegotiationEventBase,
    pub role: EndpointRole,
    pub description: SessionDescription,
}

impl DomainEvent for OfferCreated {
    fn event_type(&self) -> &'static str {
        "negotiation.offer_created"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// The answering side accepted the peer's offer
#[derive(Debug, Clone, Serialize)]
pub struct OfferAccepted {
    pub base: NegotiationEventBase,
    pub role: EndpointRole,
}

impl DomainEvent for OfferAccepted {
    fn event_type(&self) -> &'static str {
        "negotiation.offer_accepted"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// The answering side produced and holds its answer
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCreated {
    pub base: NegotiationEventBase,
    pub role: EndpointRole,
    pub description: SessionDescription,
}

impl DomainEvent for AnswerCreated {
    fn event_type(&self) -> &'static str {
        "negotiation.answer_created"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// The offering side applied the peer's answer; the exchange is complete
#[derive(Debug, Clone, Serialize)]
pub struct NegotiationCompleted {
    pub base: NegotiationEventBase,
    pub role: EndpointRole,
}

impl DomainEvent for NegotiationCompleted {
    fn event_type(&self) -> &'static str {
        "negotiation.completed"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// A local candidate was discovered after the local description was set
#[derive(Debug, Clone, Serialize)]
pub struct CandidateDiscovered {
    pub base: NegotiationEventBase,
    pub role: EndpointRole,
    pub candidate: IceCandidate,
}

impl DomainEvent for CandidateDiscovered {
    fn event_type(&self) -> &'static str {
        "negotiation.candidate_discovered"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// End-of-gathering sentinel for one side
#[derive(Debug, Clone, Serialize)]
pub struct GatheringCompleted {
    pub base: NegotiationEventBase,
    pub role: EndpointRole,
}

impl DomainEvent for GatheringCompleted {
    fn event_type(&self) -> &'static str {
        "negotiation.gathering_completed"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// A peer-discovered candidate was handed to the transport
#[derive(Debug, Clone, Serialize)]
pub struct CandidateApplied {
    pub base: NegotiationEventBase,
    pub role: EndpointRole,
    pub candidate: IceCandidate,
}

impl DomainEvent for CandidateApplied {
    fn event_type(&self) -> &'static str {
        "negotiation.candidate_applied"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// The transport reported a connectivity transition for one side
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityChanged {
    pub base: NegotiationEventBase,
    pub role: EndpointRole,
    pub previous: ConnectivityState,
    pub current: ConnectivityState,
}

impl DomainEvent for ConnectivityChanged {
    fn event_type(&self) -> &'static str {
        "negotiation.connectivity_changed"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// Both sides were released and the session is terminal
#[derive(Debug, Clone, Serialize)]
pub struct SessionTornDown {
    pub base: NegotiationEventBase,
}

impl DomainEvent for SessionTornDown {
    fn event_type(&self) -> &'static str {
        "negotiation.torn_down"
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.base.metadata.occurred_at
    }
}

/// Union of all negotiation events
#[derive(Debug, Clone, Serialize)]
pub enum NegotiationEvent {
    MediaAttached(MediaAttached),
    OfferCreated(OfferCreated),
    OfferAccepted(OfferAccepted),
    AnswerCreated(AnswerCreated),
    Completed(NegotiationCompleted),
    CandidateDiscovered(CandidateDiscovered),
    GatheringCompleted(GatheringCompleted),
    CandidateApplied(CandidateApplied),
    ConnectivityChanged(ConnectivityChanged),
    TornDown(SessionTornDown),
}

impl NegotiationEvent {
    pub fn session_id(&self) -> SessionId {
        self.base().session_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.base().metadata.occurred_at
    }

    fn base(&self) -> &NegotiationEventBase {
        match self {
            NegotiationEvent::MediaAttached(e) => &e.base,
            NegotiationEvent::OfferCreated(e) => &e.base,
            NegotiationEvent::OfferAccepted(e) => &e.base,
            NegotiationEvent::AnswerCreated(e) => &e.base,
            NegotiationEvent::Completed(e) => &e.base,
            NegotiationEvent::CandidateDiscovered(e) => &e.base,
            NegotiationEvent::GatheringCompleted(e) => &e.base,
            NegotiationEvent::CandidateApplied(e) => &e.base,
            NegotiationEvent::ConnectivityChanged(e) => &e.base,
            NegotiationEvent::TornDown(e) => &e.base,
        }
    }
}

// Constructors keep the aggregate's recording sites short.
impl NegotiationEvent {
    pub fn media_attached(
        session_id: SessionId,
        role: EndpointRole,
        track_labels: Vec<String>,
    ) -> Self {
        NegotiationEvent::MediaAttached(MediaAttached {
            base: NegotiationEventBase::new("negotiation.media_attached", session_id),
            role,
            track_labels,
        })
    }

    pub fn offer_created(
        session_id: SessionId,
        role: EndpointRole,
        description: SessionDescription,
    ) -> Self {
        NegotiationEvent::OfferCreated(OfferCreated {
            base: NegotiationEventBase::new("negotiation.offer_created", session_id),
            role,
            description,
        })
    }

    pub fn offer_accepted(session_id: SessionId, role: EndpointRole) -> Self {
        NegotiationEvent::OfferAccepted(OfferAccepted {
            base: NegotiationEventBase::new("negotiation.offer_accepted", session_id),
            role,
        })
    }

    pub fn answer_created(
        session_id: SessionId,
        role: EndpointRole,
        description: SessionDescription,
    ) -> Self {
        NegotiationEvent::AnswerCreated(AnswerCreated {
            base: NegotiationEventBase::new("negotiation.answer_created", session_id),
            role,
            description,
        })
    }

    pub fn completed(session_id: SessionId, role: EndpointRole) -> Self {
        NegotiationEvent::Completed(NegotiationCompleted {
            base: NegotiationEventBase::new("negotiation.completed", session_id),
            role,
        })
    }

    pub fn candidate_discovered(
        session_id: SessionId,
        role: EndpointRole,
        candidate: IceCandidate,
    ) -> Self {
        NegotiationEvent::CandidateDiscovered(CandidateDiscovered {
            base: NegotiationEventBase::new("negotiation.candidate_discovered", session_id),
            role,
            candidate,
        })
    }

    pub fn gathering_completed(session_id: SessionId, role: EndpointRole) -> Self {
        NegotiationEvent::GatheringCompleted(GatheringCompleted {
            base: NegotiationEventBase::new("negotiation.gathering_completed", session_id),
            role,
        })
    }

    pub fn candidate_applied(
        session_id: SessionId,
        role: EndpointRole,
        candidate: IceCandidate,
    ) -> Self {
        NegotiationEvent::CandidateApplied(CandidateApplied {
            base: NegotiationEventBase::new("negotiation.candidate_applied", session_id),
            role,
            candidate,
        })
    }

    pub fn connectivity_changed(
        session_id: SessionId,
        role: EndpointRole,
        previous: ConnectivityState,
        current: ConnectivityState,
    ) -> Self {
        NegotiationEvent::ConnectivityChanged(ConnectivityChanged {
            base: NegotiationEventBase::new("negotiation.connectivity_changed", session_id),
            role,
            previous,
            current,
        })
    }

    pub fn torn_down(session_id: SessionId) -> Self {
        NegotiationEvent::TornDown(SessionTornDown {
            base: NegotiationEventBase::new("negotiation.torn_down", session_id),
        })
    }
}
