//! Same-process call use case
//!
//! Both sides of the session live in one coordinator; signaling is a
//! loopback, candidates are delivered by direct in-process calls.

use crate::application::router::SignalRouter;
use crate::domain::negotiation::media::MediaSource;
use crate::domain::negotiation::observer::NegotiationObserver;
use crate::domain::negotiation::signaling::SignalingChannel;
use crate::domain::negotiation::value_object::{EndpointRole, MediaConstraints};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::SessionId;
use crate::infrastructure::rtc::coordinator::NegotiationCoordinator;
use crate::infrastructure::signaling::in_process::LoopbackChannel;
use std::sync::Arc;
use tracing::info;

pub struct SameProcessCall {
    coordinator: Arc<NegotiationCoordinator>,
    channel: Arc<LoopbackChannel>,
    media: Arc<dyn MediaSource>,
    constraints: MediaConstraints,
}

impl SameProcessCall {
    pub fn new(
        observer: Arc<dyn NegotiationObserver>,
        media: Arc<dyn MediaSource>,
        constraints: MediaConstraints,
        stun_servers: Vec<String>,
    ) -> Self {
        let channel = Arc::new(LoopbackChannel::new());
        let coordinator = Arc::new(NegotiationCoordinator::new(
            channel.clone(),
            observer,
            stun_servers,
        ));
        Self {
            coordinator,
            channel,
            media,
            constraints,
        }
    }

    /// Place the call: acquire media, open the session and drive the whole
    /// exchange through the loopback. Returns once the offer side has
    /// started; the answer and candidate traffic completes inline.
    pub async fn call(&self) -> Result<SessionId> {
        let router = SignalRouter::new(
            self.coordinator.clone(),
            self.media.clone(),
            self.constraints,
        );
        self.channel.on_receive(router.handler()).await;

        let session_id = self.coordinator.open_session().await;
        let handle = self.media.acquire(&self.constraints).await?;
        self.coordinator
            .attach_media(session_id, EndpointRole::Local, handle)
            .await?;

        info!("starting call on session {}", session_id);
        self.coordinator.start_negotiation(session_id).await?;
        Ok(session_id)
    }

    /// Hang up: tear the session down on both sides
    pub async fn hang_up(&self, session_id: SessionId) -> Result<()> {
        info!("ending call on session {}", session_id);
        self.coordinator.teardown(session_id).await
    }

    pub fn coordinator(&self) -> &Arc<NegotiationCoordinator> {
        &self.coordinator
    }
}
