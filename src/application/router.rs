//! Signaling message routing
//!
//! Connects a channel's inbound messages to coordinator operations. The
//! peer is always addressed explicitly through the role tag carried by the
//! message: a candidate from one side lands on the other side's transport.

use crate::domain::negotiation::media::MediaSource;
use crate::domain::negotiation::signaling::{ReceiveHandler, SignalingMessage};
use crate::domain::negotiation::value_object::{EndpointRole, MediaConstraints};
use crate::infrastructure::rtc::coordinator::NegotiationCoordinator;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SignalRouter {
    coordinator: Arc<NegotiationCoordinator>,
    media: Arc<dyn MediaSource>,
    constraints: MediaConstraints,
}

impl SignalRouter {
    pub fn new(
        coordinator: Arc<NegotiationCoordinator>,
        media: Arc<dyn MediaSource>,
        constraints: MediaConstraints,
    ) -> Arc<Self> {
        Arc::new(Self {
            coordinator,
            media,
            constraints,
        })
    }

    /// Handler to register on the channel feeding this router
    pub fn handler(self: &Arc<Self>) -> ReceiveHandler {
        let router = self.clone();
        Box::new(move |message| {
            let router = router.clone();
            Box::pin(async move {
                router.route(message).await;
            })
        })
    }

    /// Route one inbound message. Failures are already reported to the
    /// observer by the coordinator; routing itself never aborts the session.
    async fn route(&self, message: SignalingMessage) {
        match message {
            SignalingMessage::Offer {
                session_id,
                description,
                ..
            } => {
                if !self.coordinator.has_session(session_id).await {
                    if let Err(error) = self.coordinator.join_session(session_id).await {
                        warn!("cannot join offered session {}: {}", session_id, error);
                        return;
                    }
                    match self.media.acquire(&self.constraints).await {
                        Ok(handle) => {
                            if let Err(error) = self
                                .coordinator
                                .attach_media(session_id, EndpointRole::Remote, handle)
                                .await
                            {
                                warn!("cannot attach media to {}: {}", session_id, error);
                            }
                        }
                        // Answering without local media is still possible
                        Err(error) => warn!("media acquire failed: {}", error),
                    }
                }
                if self
                    .coordinator
                    .accept_offer(session_id, description)
                    .await
                    .is_err()
                {
                    debug!("offer for session {} not accepted", session_id);
                }
            }
            SignalingMessage::Answer {
                session_id,
                description,
                ..
            } => {
                if self
                    .coordinator
                    .complete_negotiation(session_id, description)
                    .await
                    .is_err()
                {
                    debug!("answer for session {} not applied", session_id);
                }
            }
            SignalingMessage::Candidate {
                session_id,
                from,
                candidate,
            } => {
                // A candidate discovered by one side lands on the other
                if self
                    .coordinator
                    .apply_remote_candidate(session_id, from.peer(), candidate.as_deref())
                    .await
                    .is_err()
                {
                    debug!("candidate for session {} dropped", session_id);
                }
            }
        }
    }
}
