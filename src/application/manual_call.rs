//! Manual-exchange call use case
//!
//! Two independent coordinators with no signaling path between them; every
//! message crosses as armored copy-paste text. The session id travels inside
//! the offer, so the answering side joins the caller's session.

use crate::application::router::SignalRouter;
use crate::domain::negotiation::media::MediaSource;
use crate::domain::negotiation::observer::NegotiationObserver;
use crate::domain::negotiation::signaling::SignalingChannel;
use crate::domain::negotiation::value_object::{EndpointRole, MediaConstraints};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::SessionId;
use crate::infrastructure::rtc::coordinator::NegotiationCoordinator;
use crate::infrastructure::signaling::copy_paste::ManualSignaling;
use std::sync::Arc;
use tracing::info;

/// One side of the manual exchange
pub struct ManualPeer {
    coordinator: Arc<NegotiationCoordinator>,
    channel: Arc<ManualSignaling>,
    media: Arc<dyn MediaSource>,
    constraints: MediaConstraints,
}

impl ManualPeer {
    pub async fn new(
        observer: Arc<dyn NegotiationObserver>,
        media: Arc<dyn MediaSource>,
        constraints: MediaConstraints,
        stun_servers: Vec<String>,
    ) -> Self {
        let channel = Arc::new(ManualSignaling::new());
        let coordinator = Arc::new(NegotiationCoordinator::new(
            channel.clone(),
            observer,
            stun_servers,
        ));
        let router = SignalRouter::new(coordinator.clone(), media.clone(), constraints);
        channel.on_receive(router.handler()).await;

        Self {
            coordinator,
            channel,
            media,
            constraints,
        }
    }

    /// Start a call attempt: the offer and the candidates that follow pile
    /// up in the outbox for the user to copy
    pub async fn start_call(&self) -> Result<SessionId> {
        let session_id = self.coordinator.open_session().await;
        let handle = self.media.acquire(&self.constraints).await?;
        self.coordinator
            .attach_media(session_id, EndpointRole::Local, handle)
            .await?;
        self.coordinator.start_negotiation(session_id).await?;
        Ok(session_id)
    }

    /// Armored text waiting to be copied to the other side
    pub fn outbox(&self) -> Vec<String> {
        self.channel.take_outbox()
    }

    /// Paste one armored block received from the other side
    pub async fn paste(&self, text: &str) -> Result<()> {
        self.channel.paste(text).await
    }

    /// Paste an armored bundle (description plus candidates) in one go
    pub async fn paste_bundle(&self, text: &str) -> Result<()> {
        self.channel.paste_bundle(text).await
    }

    pub async fn hang_up(&self, session_id: SessionId) -> Result<()> {
        self.coordinator.teardown(session_id).await
    }

    pub fn coordinator(&self) -> &Arc<NegotiationCoordinator> {
        &self.coordinator
    }
}

/// Drives a full call between two manual peers, playing the user who
/// ferries text between the pages
pub struct ManualExchangeCall {
    caller: ManualPeer,
    callee: ManualPeer,
}

impl ManualExchangeCall {
    pub fn new(caller: ManualPeer, callee: ManualPeer) -> Self {
        Self { caller, callee }
    }

    pub async fn run(&self) -> Result<SessionId> {
        let session_id = self.caller.start_call().await?;

        // Copy the offer and the caller's candidates across
        for text in self.caller.outbox() {
            self.callee.paste(&text).await?;
        }
        info!("offer side pasted, answer waiting in callee outbox");

        // Copy the answer and the callee's candidates back
        for text in self.callee.outbox() {
            self.caller.paste(&text).await?;
        }
        info!("answer side pasted, session {} negotiated", session_id);

        Ok(session_id)
    }

    pub fn caller(&self) -> &ManualPeer {
        &self.caller
    }

    pub fn callee(&self) -> &ManualPeer {
        &self.callee
    }
}
