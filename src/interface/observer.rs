//! Tracing-backed observer
//!
//! Renders negotiation progress as log lines. Connectivity transitions and
//! tolerated failures surface here; nothing is retried.

use crate::domain::negotiation::event::NegotiationEvent;
use crate::domain::negotiation::observer::NegotiationObserver;
use crate::domain::shared::error::NegotiationError;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl NegotiationObserver for TracingObserver {
    fn on_event(&self, event: &NegotiationEvent) {
        match event {
            NegotiationEvent::MediaAttached(e) => {
                info!(
                    "session {}: {} side attached media [{}]",
                    e.base.session_id,
                    e.role,
                    e.track_labels.join(", ")
                );
            }
            NegotiationEvent::OfferCreated(e) => {
                info!("session {}: offer from {} side", e.base.session_id, e.role);
                debug!("offer sdp:\n{}", e.description.sdp());
            }
            NegotiationEvent::OfferAccepted(e) => {
                info!("session {}: {} side accepted offer", e.base.session_id, e.role);
            }
            NegotiationEvent::AnswerCreated(e) => {
                info!("session {}: answer from {} side", e.base.session_id, e.role);
                debug!("answer sdp:\n{}", e.description.sdp());
            }
            NegotiationEvent::Completed(e) => {
                info!(
                    "session {}: {} side applied answer, negotiation complete",
                    e.base.session_id, e.role
                );
            }
            NegotiationEvent::CandidateDiscovered(e) => {
                debug!(
                    "session {}: {} candidate: {}",
                    e.base.session_id,
                    e.role,
                    e.candidate.to_attribute()
                );
            }
            NegotiationEvent::GatheringCompleted(e) => {
                debug!(
                    "session {}: {} side finished gathering",
                    e.base.session_id, e.role
                );
            }
            NegotiationEvent::CandidateApplied(e) => {
                debug!(
                    "session {}: {} side added candidate {}",
                    e.base.session_id,
                    e.role,
                    e.candidate.address
                );
            }
            NegotiationEvent::ConnectivityChanged(e) => {
                info!(
                    "session {}: {} connectivity {} -> {}",
                    e.base.session_id, e.role, e.previous, e.current
                );
            }
            NegotiationEvent::TornDown(e) => {
                info!("session {}: torn down", e.base.session_id);
            }
        }
    }

    fn on_error(&self, error: &NegotiationError) {
        warn!("negotiation error: {}", error);
    }
}
