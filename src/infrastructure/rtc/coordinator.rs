//! Offer/Answer Negotiation Coordinator
//!
//! Drives the two-phase SDP exchange and continuous candidate exchange for
//! the sessions it manages, forwarding outbound messages through the
//! Signaling Channel and reporting every event and tolerated failure to the
//! Observer. Failing steps leave the session in its last stable state; there
//! is no rollback and no retry.

use crate::domain::negotiation::candidate::IceCandidate;
use crate::domain::negotiation::event::NegotiationEvent;
use crate::domain::negotiation::media::MediaHandle;
use crate::domain::negotiation::observer::NegotiationObserver;
use crate::domain::negotiation::session::NegotiationSession;
use crate::domain::negotiation::signaling::{SignalingChannel, SignalingMessage};
use crate::domain::negotiation::value_object::{
    EndpointRole, SdpKind, SessionDescription,
};
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::SessionId;
use crate::infrastructure::rtc::connectivity::ConnectivityProbe;
use crate::infrastructure::rtc::gathering::CandidateGatherer;
use crate::infrastructure::rtc::sdp::{
    build_answer, build_offer, random_ice_pwd, random_ice_ufrag, SdpDocument,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub struct NegotiationCoordinator {
    /// Active and terminated sessions (session_id -> session). Terminated
    /// sessions stay registered so late operations fail with the terminal
    /// error instead of "not found".
    sessions: Arc<RwLock<HashMap<SessionId, NegotiationSession>>>,
    channel: Arc<dyn SignalingChannel>,
    observer: Arc<dyn NegotiationObserver>,
    gatherer: CandidateGatherer,
    probe: ConnectivityProbe,
}

impl NegotiationCoordinator {
    pub fn new(
        channel: Arc<dyn SignalingChannel>,
        observer: Arc<dyn NegotiationObserver>,
        stun_servers: Vec<String>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            channel,
            observer,
            gatherer: CandidateGatherer::new(stun_servers),
            probe: ConnectivityProbe::new(),
        }
    }

    /// Create a fresh session for a new call attempt
    pub async fn open_session(&self) -> SessionId {
        let session = NegotiationSession::new();
        let session_id = session.id();
        self.sessions.write().await.insert(session_id, session);
        info!("opened negotiation session {}", session_id);
        session_id
    }

    /// Adopt a session id received from the peer (two-process variant). A
    /// second join of an in-flight pair violates the one-active-session
    /// invariant.
    pub async fn join_session(&self, session_id: SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&session_id) {
            return Err(if existing.is_closed() {
                NegotiationError::SessionClosed(session_id)
            } else {
                NegotiationError::SessionAlreadyActive(session_id)
            });
        }
        sessions.insert(session_id, NegotiationSession::with_id(session_id));
        info!("joined negotiation session {}", session_id);
        Ok(())
    }

    pub async fn has_session(&self, session_id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&session_id)
    }

    /// Attach a live capture to one side of a session
    pub async fn attach_media(
        &self,
        session_id: SessionId,
        role: EndpointRole,
        handle: MediaHandle,
    ) -> Result<()> {
        let events = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(NegotiationError::SessionNotFound(session_id))?;
            session.attach_media(role, handle)?;
            session.take_events()
        };
        self.notify(&events);
        Ok(())
    }

    /// Produce the offer for the session's local side and begin candidate
    /// gathering. The local side must hold a live media handle.
    pub async fn start_negotiation(&self, session_id: SessionId) -> Result<SessionDescription> {
        let result = self.start_negotiation_inner(session_id).await;
        self.report_if_failed(&result);
        result
    }

    async fn start_negotiation_inner(
        &self,
        session_id: SessionId,
    ) -> Result<SessionDescription> {
        let (description, offer_doc, events) = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(NegotiationError::SessionNotFound(session_id))?;

            let media = match session.endpoint(EndpointRole::Local).media() {
                Some(media) if !media.kinds().is_empty() => media.clone(),
                _ => return Err(NegotiationError::NoMediaSource),
            };

            let offer_doc = build_offer(&media.kinds(), random_ice_ufrag(), random_ice_pwd());
            let description = SessionDescription::offer(offer_doc.to_sdp_string());
            session.hold_local_description(EndpointRole::Local, description.clone())?;
            (description, offer_doc, session.take_events())
        };
        self.notify(&events);
        info!("session {} offer created", session_id);

        self.channel
            .send(SignalingMessage::Offer {
                session_id,
                from: EndpointRole::Local,
                description: description.clone(),
            })
            .await?;

        self.run_gathering(session_id, EndpointRole::Local, &offer_doc)
            .await?;

        Ok(description)
    }

    /// Consume the peer's offer on the session's remote side and produce the
    /// answer
    pub async fn accept_offer(
        &self,
        session_id: SessionId,
        offer: SessionDescription,
    ) -> Result<SessionDescription> {
        let result = self.accept_offer_inner(session_id, offer).await;
        self.report_if_failed(&result);
        result
    }

    async fn accept_offer_inner(
        &self,
        session_id: SessionId,
        offer: SessionDescription,
    ) -> Result<SessionDescription> {
        if offer.kind() != SdpKind::Offer {
            return Err(NegotiationError::MalformedDescription(format!(
                "expected an offer, got {}",
                offer.kind()
            )));
        }
        let offer_doc = SdpDocument::parse(offer.sdp())?;

        let (answer, answer_doc, events) = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(NegotiationError::SessionNotFound(session_id))?;

            session.hold_remote_description(EndpointRole::Remote, offer)?;

            let answer_doc = build_answer(&offer_doc, random_ice_ufrag(), random_ice_pwd());
            let answer = SessionDescription::answer(answer_doc.to_sdp_string());
            session.hold_local_description(EndpointRole::Remote, answer.clone())?;

            // Offers from a single paste may carry candidates inline
            for section in &offer_doc.media {
                for candidate in &section.candidates {
                    session.apply_remote_candidate(EndpointRole::Remote, candidate.clone())?;
                }
            }
            self.advance_connectivity(session, EndpointRole::Remote)?;

            (answer, answer_doc, session.take_events())
        };
        self.notify(&events);
        info!("session {} answer created", session_id);

        self.channel
            .send(SignalingMessage::Answer {
                session_id,
                from: EndpointRole::Remote,
                description: answer.clone(),
            })
            .await?;

        self.run_gathering(session_id, EndpointRole::Remote, &answer_doc)
            .await?;

        Ok(answer)
    }

    /// Apply the peer's answer on the session's local side. Re-applying
    /// after an answer is already held is a no-op.
    pub async fn complete_negotiation(
        &self,
        session_id: SessionId,
        answer: SessionDescription,
    ) -> Result<()> {
        let result = self.complete_negotiation_inner(session_id, answer).await;
        self.report_if_failed(&result);
        result
    }

    async fn complete_negotiation_inner(
        &self,
        session_id: SessionId,
        answer: SessionDescription,
    ) -> Result<()> {
        if answer.kind() != SdpKind::Answer {
            return Err(NegotiationError::MalformedDescription(format!(
                "expected an answer, got {}",
                answer.kind()
            )));
        }
        let answer_doc = SdpDocument::parse(answer.sdp())?;

        let events = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(NegotiationError::SessionNotFound(session_id))?;

            if session
                .endpoint(EndpointRole::Local)
                .remote_description()
                .is_some()
            {
                debug!("session {} already holds an answer, ignoring", session_id);
                return Ok(());
            }

            session.hold_remote_description(EndpointRole::Local, answer)?;
            for section in &answer_doc.media {
                for candidate in &section.candidates {
                    session.apply_remote_candidate(EndpointRole::Local, candidate.clone())?;
                }
            }
            self.advance_connectivity(session, EndpointRole::Local)?;
            session.take_events()
        };
        self.notify(&events);
        info!("session {} negotiation completed", session_id);
        Ok(())
    }

    /// Hand a peer-discovered candidate (SDP attribute text) to one side.
    /// Malformed text fails with `InvalidCandidate`; the failure is reported
    /// and tolerated, the session keeps going on its other candidates.
    pub async fn apply_remote_candidate(
        &self,
        session_id: SessionId,
        role: EndpointRole,
        candidate: Option<&str>,
    ) -> Result<()> {
        let result = self
            .apply_remote_candidate_inner(session_id, role, candidate)
            .await;
        self.report_if_failed(&result);
        result
    }

    async fn apply_remote_candidate_inner(
        &self,
        session_id: SessionId,
        role: EndpointRole,
        candidate: Option<&str>,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(NegotiationError::SessionNotFound(session_id))?;

        if session.is_closed() {
            return Err(NegotiationError::SessionClosed(session_id));
        }

        let events = match candidate {
            None => {
                debug!("session {} peer finished gathering for {}", session_id, role);
                return Ok(());
            }
            Some(attribute) => {
                let candidate = IceCandidate::from_attribute(attribute)?;
                session.apply_remote_candidate(role, candidate)?;
                self.advance_connectivity(session, role)?;
                session.take_events()
            }
        };
        drop(sessions);
        self.notify(&events);
        Ok(())
    }

    /// Release both endpoints and mark the session terminal. Idempotent.
    pub async fn teardown(&self, session_id: SessionId) -> Result<()> {
        let events = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(NegotiationError::SessionNotFound(session_id))?;
            session.close();
            session.take_events()
        };
        self.notify(&events);
        info!("session {} torn down", session_id);
        Ok(())
    }

    /// Snapshot of a session for inspection
    pub async fn session(&self, session_id: SessionId) -> Result<NegotiationSession> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(NegotiationError::SessionNotFound(session_id))
    }

    pub async fn active_session_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|s| !s.is_closed())
            .count()
    }

    /// Discover candidates for `role`, buffer and forward each, then the
    /// end-of-gathering sentinel
    async fn run_gathering(
        &self,
        session_id: SessionId,
        role: EndpointRole,
        description: &SdpDocument,
    ) -> Result<()> {
        let candidates = self.gatherer.gather(description).await;

        let events = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(&session_id)
                .ok_or(NegotiationError::SessionNotFound(session_id))?;
            for candidate in &candidates {
                session.record_local_candidate(role, Some(candidate.clone()))?;
            }
            session.record_local_candidate(role, None)?;
            self.advance_connectivity(session, role)?;
            session.take_events()
        };
        self.notify(&events);

        for candidate in &candidates {
            debug!(
                "session {} forwarding {} candidate: {}",
                session_id,
                role,
                candidate.to_attribute()
            );
            self.channel
                .send(SignalingMessage::Candidate {
                    session_id,
                    from: role,
                    candidate: Some(candidate.to_attribute()),
                })
                .await?;
        }
        self.channel
            .send(SignalingMessage::Candidate {
                session_id,
                from: role,
                candidate: None,
            })
            .await?;
        Ok(())
    }

    /// Step `role`'s connectivity as far as the evidence supports
    fn advance_connectivity(
        &self,
        session: &mut NegotiationSession,
        role: EndpointRole,
    ) -> Result<()> {
        while let Some(next) = self.probe.next_state(session.endpoint(role)) {
            session.observe_connectivity(role, next)?;
        }
        Ok(())
    }

    fn notify(&self, events: &[NegotiationEvent]) {
        for event in events {
            self.observer.on_event(event);
        }
    }

    fn report_if_failed<T>(&self, result: &Result<T>) {
        if let Err(error) = result {
            warn!("negotiation step failed: {}", error);
            self.observer.on_error(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::negotiation::media::{MediaKind, MediaTrack};
    use crate::domain::negotiation::signaling::ReceiveHandler;
    use crate::domain::negotiation::value_object::{ConnectivityState, SignalingState};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Channel double that records what the coordinator hands it
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<SignalingMessage>>,
    }

    impl RecordingChannel {
        fn sent(&self) -> Vec<SignalingMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SignalingChannel for RecordingChannel {
        async fn send(&self, message: SignalingMessage) -> Result<()> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn on_receive(&self, _handler: ReceiveHandler) {}
    }

    /// Observer double counting events and errors
    #[derive(Default)]
    struct CountingObserver {
        events: Mutex<Vec<NegotiationEvent>>,
        errors: Mutex<Vec<NegotiationError>>,
    }

    impl NegotiationObserver for CountingObserver {
        fn on_event(&self, event: &NegotiationEvent) {
            self.events.lock().unwrap().push(event.clone());
        }

        fn on_error(&self, error: &NegotiationError) {
            self.errors.lock().unwrap().push(error.clone());
        }
    }

    fn video_handle() -> MediaHandle {
        MediaHandle::new(vec![MediaTrack::new(MediaKind::Video, "Synthetic Camera")])
    }

    fn coordinator() -> (
        Arc<NegotiationCoordinator>,
        Arc<RecordingChannel>,
        Arc<CountingObserver>,
    ) {
        let channel = Arc::new(RecordingChannel::default());
        let observer = Arc::new(CountingObserver::default());
        let coordinator = Arc::new(NegotiationCoordinator::new(
            channel.clone(),
            observer.clone(),
            vec!["stun:stun1.l.google.com:19302".into()],
        ));
        (coordinator, channel, observer)
    }

    #[tokio::test]
    async fn test_start_requires_media() {
        let (coordinator, _, observer) = coordinator();
        let session_id = coordinator.open_session().await;

        let result = coordinator.start_negotiation(session_id).await;
        assert_eq!(result, Err(NegotiationError::NoMediaSource));
        assert_eq!(
            *observer.errors.lock().unwrap(),
            vec![NegotiationError::NoMediaSource]
        );
    }

    #[tokio::test]
    async fn test_channel_failure_is_reported() {
        let mut channel = crate::domain::negotiation::signaling::MockSignalingChannel::new();
        channel.expect_send().returning(|_| {
            Err(NegotiationError::ChannelClosed("clipboard gone".to_string()))
        });

        let observer = Arc::new(CountingObserver::default());
        let coordinator = NegotiationCoordinator::new(
            Arc::new(channel),
            observer.clone(),
            Vec::new(),
        );

        let session_id = coordinator.open_session().await;
        coordinator
            .attach_media(session_id, EndpointRole::Local, video_handle())
            .await
            .unwrap();

        let result = coordinator.start_negotiation(session_id).await;
        assert!(matches!(result, Err(NegotiationError::ChannelClosed(_))));
        assert_eq!(observer.errors.lock().unwrap().len(), 1);

        // The offer side is left where it was; no rollback happened
        let session = coordinator.session(session_id).await.unwrap();
        assert_eq!(
            session.endpoint(EndpointRole::Local).signaling_state(),
            SignalingState::HaveLocalOffer
        );
    }

    #[tokio::test]
    async fn test_offer_then_candidates_then_sentinel() {
        let (coordinator, channel, _) = coordinator();
        let session_id = coordinator.open_session().await;
        coordinator
            .attach_media(session_id, EndpointRole::Local, video_handle())
            .await
            .unwrap();

        let offer = coordinator.start_negotiation(session_id).await.unwrap();
        assert_eq!(offer.kind(), SdpKind::Offer);

        let sent = channel.sent();
        assert!(matches!(sent[0], SignalingMessage::Offer { .. }));
        assert!(matches!(
            sent.last(),
            Some(SignalingMessage::Candidate {
                candidate: None,
                ..
            })
        ));
        // video-only: host + srflx, then the sentinel
        assert_eq!(sent.len(), 4);

        let session = coordinator.session(session_id).await.unwrap();
        assert_eq!(
            session.endpoint(EndpointRole::Local).signaling_state(),
            SignalingState::HaveLocalOffer
        );
        assert!(session.endpoint(EndpointRole::Local).gathering_complete());
    }

    #[tokio::test]
    async fn test_full_exchange_in_one_coordinator() {
        let (coordinator, _, _) = coordinator();
        let session_id = coordinator.open_session().await;
        coordinator
            .attach_media(session_id, EndpointRole::Local, video_handle())
            .await
            .unwrap();
        coordinator
            .attach_media(session_id, EndpointRole::Remote, video_handle())
            .await
            .unwrap();

        let offer = coordinator.start_negotiation(session_id).await.unwrap();
        let answer = coordinator.accept_offer(session_id, offer).await.unwrap();
        coordinator
            .complete_negotiation(session_id, answer)
            .await
            .unwrap();

        let session = coordinator.session(session_id).await.unwrap();
        assert_eq!(
            session.endpoint(EndpointRole::Local).remote_description(),
            session.endpoint(EndpointRole::Remote).local_description(),
        );
        assert_eq!(
            session.endpoint(EndpointRole::Local).signaling_state(),
            SignalingState::Stable
        );
        assert_eq!(
            session.endpoint(EndpointRole::Remote).signaling_state(),
            SignalingState::Stable
        );
    }

    #[tokio::test]
    async fn test_accept_rejects_answer_kind() {
        let (coordinator, _, _) = coordinator();
        let session_id = coordinator.open_session().await;

        let not_an_offer =
            SessionDescription::answer("v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\nm=video 9 X 96\r\n".into());
        assert!(matches!(
            coordinator.accept_offer(session_id, not_an_offer).await,
            Err(NegotiationError::MalformedDescription(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_answer_is_noop() {
        let (coordinator, _, observer) = coordinator();
        let session_id = coordinator.open_session().await;
        coordinator
            .attach_media(session_id, EndpointRole::Local, video_handle())
            .await
            .unwrap();

        let offer = coordinator.start_negotiation(session_id).await.unwrap();
        let answer = coordinator.accept_offer(session_id, offer).await.unwrap();
        coordinator
            .complete_negotiation(session_id, answer.clone())
            .await
            .unwrap();
        coordinator
            .complete_negotiation(session_id, answer)
            .await
            .unwrap();
        assert!(observer.errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_candidate_tolerated() {
        let (coordinator, _, observer) = coordinator();
        let session_id = coordinator.open_session().await;
        coordinator
            .attach_media(session_id, EndpointRole::Local, video_handle())
            .await
            .unwrap();
        let offer = coordinator.start_negotiation(session_id).await.unwrap();
        coordinator.accept_offer(session_id, offer).await.unwrap();

        let result = coordinator
            .apply_remote_candidate(session_id, EndpointRole::Remote, Some("garbage"))
            .await;
        assert!(matches!(
            result,
            Err(NegotiationError::InvalidCandidate(_))
        ));
        assert_eq!(observer.errors.lock().unwrap().len(), 1);

        // The session is still usable afterwards
        let good = IceCandidate::new(
            crate::domain::negotiation::candidate::CandidateType::Host,
            "192.168.1.77:7777".parse().unwrap(),
            1,
        );
        coordinator
            .apply_remote_candidate(
                session_id,
                EndpointRole::Remote,
                Some(&good.to_attribute()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_premature_candidate_rejected() {
        let (coordinator, _, _) = coordinator();
        let session_id = coordinator.open_session().await;

        let candidate = IceCandidate::new(
            crate::domain::negotiation::candidate::CandidateType::Host,
            "192.168.1.77:7777".parse().unwrap(),
            1,
        );
        assert_eq!(
            coordinator
                .apply_remote_candidate(
                    session_id,
                    EndpointRole::Local,
                    Some(&candidate.to_attribute())
                )
                .await,
            Err(NegotiationError::PrematureCandidate)
        );
    }

    #[tokio::test]
    async fn test_teardown_is_idempotent_and_terminal() {
        let (coordinator, _, _) = coordinator();
        let session_id = coordinator.open_session().await;
        assert_eq!(coordinator.active_session_count().await, 1);

        coordinator.teardown(session_id).await.unwrap();
        coordinator.teardown(session_id).await.unwrap();
        assert_eq!(coordinator.active_session_count().await, 0);

        assert_eq!(
            coordinator
                .apply_remote_candidate(session_id, EndpointRole::Local, Some("x"))
                .await,
            Err(NegotiationError::SessionClosed(session_id))
        );
    }

    #[tokio::test]
    async fn test_join_session_enforces_single_active_pair() {
        let (coordinator, _, _) = coordinator();
        let session_id = coordinator.open_session().await;

        assert_eq!(
            coordinator.join_session(session_id).await,
            Err(NegotiationError::SessionAlreadyActive(session_id))
        );

        coordinator.teardown(session_id).await.unwrap();
        assert_eq!(
            coordinator.join_session(session_id).await,
            Err(NegotiationError::SessionClosed(session_id))
        );
    }

    #[tokio::test]
    async fn test_connected_after_candidates_cross() {
        let (coordinator, channel, _) = coordinator();
        let session_id = coordinator.open_session().await;
        coordinator
            .attach_media(session_id, EndpointRole::Local, video_handle())
            .await
            .unwrap();
        coordinator
            .attach_media(session_id, EndpointRole::Remote, video_handle())
            .await
            .unwrap();

        let offer = coordinator.start_negotiation(session_id).await.unwrap();
        let answer = coordinator.accept_offer(session_id, offer).await.unwrap();
        coordinator
            .complete_negotiation(session_id, answer)
            .await
            .unwrap();

        // Cross-deliver every gathered candidate, as the page would
        for message in channel.sent() {
            if let SignalingMessage::Candidate {
                from, candidate, ..
            } = message
            {
                coordinator
                    .apply_remote_candidate(session_id, from.peer(), candidate.as_deref())
                    .await
                    .unwrap();
            }
        }

        let session = coordinator.session(session_id).await.unwrap();
        assert_eq!(
            session.endpoint(EndpointRole::Local).connectivity_state(),
            ConnectivityState::Connected
        );
        assert_eq!(
            session.endpoint(EndpointRole::Remote).connectivity_state(),
            ConnectivityState::Connected
        );
        assert!(session.setup_time().is_some());
    }
}
