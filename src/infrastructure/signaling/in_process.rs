//! In-process signaling delivery
//!
//! Two shapes, both without any network: `LoopbackChannel` hands every sent
//! message straight back to its own handler (one coordinator owning both
//! sides of the session), and `InProcessChannel::pair()` crosses two halves
//! so two coordinators in one process can talk.

use crate::domain::negotiation::signaling::{ReceiveHandler, SignalingChannel, SignalingMessage};
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

#[derive(Default)]
struct Inbound {
    handler: Option<Arc<ReceiveHandler>>,
    pending: Vec<SignalingMessage>,
}

impl Inbound {
    /// Deliver through the handler, or queue until one is registered.
    /// The handler is invoked outside the state lock so nested sends from
    /// inside it cannot deadlock.
    async fn deliver(state: &Mutex<Inbound>, message: SignalingMessage) {
        let handler = {
            let mut inbound = state.lock().await;
            match inbound.handler.clone() {
                Some(handler) => handler,
                None => {
                    inbound.pending.push(message);
                    return;
                }
            }
        };
        handler(message).await;
    }

    async fn install(state: &Mutex<Inbound>, handler: ReceiveHandler) {
        let handler = Arc::new(handler);
        let pending = {
            let mut inbound = state.lock().await;
            inbound.handler = Some(handler.clone());
            std::mem::take(&mut inbound.pending)
        };
        for message in pending {
            handler(message).await;
        }
    }
}

/// Same-process delivery: sent messages come straight back to the sender's
/// own handler
#[derive(Default)]
pub struct LoopbackChannel {
    inbound: Mutex<Inbound>,
}

impl LoopbackChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignalingChannel for LoopbackChannel {
    async fn send(&self, message: SignalingMessage) -> Result<()> {
        debug!("loopback delivering {:?}", message.session_id());
        Inbound::deliver(&self.inbound, message).await;
        Ok(())
    }

    async fn on_receive(&self, handler: ReceiveHandler) {
        Inbound::install(&self.inbound, handler).await;
    }
}

/// One half of a crossed in-process pair
pub struct InProcessChannel {
    peer_tx: mpsc::UnboundedSender<SignalingMessage>,
    inbound: Arc<Mutex<Inbound>>,
}

impl InProcessChannel {
    /// Build two halves wired to each other. Each half pumps its inbound
    /// messages on a background task.
    pub fn pair() -> (Arc<InProcessChannel>, Arc<InProcessChannel>) {
        let (tx_ab, rx_ab) = mpsc::unbounded_channel();
        let (tx_ba, rx_ba) = mpsc::unbounded_channel();

        let first = Arc::new(InProcessChannel {
            peer_tx: tx_ab,
            inbound: Arc::new(Mutex::new(Inbound::default())),
        });
        let second = Arc::new(InProcessChannel {
            peer_tx: tx_ba,
            inbound: Arc::new(Mutex::new(Inbound::default())),
        });

        tokio::spawn(Self::pump(rx_ba, first.inbound.clone()));
        tokio::spawn(Self::pump(rx_ab, second.inbound.clone()));

        (first, second)
    }

    async fn pump(
        mut rx: mpsc::UnboundedReceiver<SignalingMessage>,
        inbound: Arc<Mutex<Inbound>>,
    ) {
        while let Some(message) = rx.recv().await {
            Inbound::deliver(&inbound, message).await;
        }
    }
}

#[async_trait]
impl SignalingChannel for InProcessChannel {
    async fn send(&self, message: SignalingMessage) -> Result<()> {
        self.peer_tx
            .send(message)
            .map_err(|_| NegotiationError::ChannelClosed("peer half dropped".to_string()))
    }

    async fn on_receive(&self, handler: ReceiveHandler) {
        Inbound::install(&self.inbound, handler).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::negotiation::value_object::EndpointRole;
    use crate::domain::shared::value_objects::SessionId;
    use std::sync::Mutex as StdMutex;

    fn sentinel(session_id: SessionId) -> SignalingMessage {
        SignalingMessage::Candidate {
            session_id,
            from: EndpointRole::Local,
            candidate: None,
        }
    }

    fn collecting_handler(
        seen: Arc<StdMutex<Vec<SignalingMessage>>>,
    ) -> ReceiveHandler {
        Box::new(move |message| {
            let seen = seen.clone();
            Box::pin(async move {
                seen.lock().unwrap().push(message);
            })
        })
    }

    #[tokio::test]
    async fn test_loopback_delivers_to_own_handler() {
        let channel = LoopbackChannel::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        channel.on_receive(collecting_handler(seen.clone())).await;

        let session_id = SessionId::new();
        channel.send(sentinel(session_id)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].session_id(), session_id);
    }

    #[tokio::test]
    async fn test_messages_before_handler_are_queued_in_order() {
        let channel = LoopbackChannel::new();
        let a = SessionId::new();
        let b = SessionId::new();
        channel.send(sentinel(a)).await.unwrap();
        channel.send(sentinel(b)).await.unwrap();

        let seen = Arc::new(StdMutex::new(Vec::new()));
        channel.on_receive(collecting_handler(seen.clone())).await;

        let ids: Vec<_> = seen.lock().unwrap().iter().map(|m| m.session_id()).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn test_pair_crosses_halves() {
        let (first, second) = InProcessChannel::pair();

        let seen_first = Arc::new(StdMutex::new(Vec::new()));
        let seen_second = Arc::new(StdMutex::new(Vec::new()));
        first.on_receive(collecting_handler(seen_first.clone())).await;
        second
            .on_receive(collecting_handler(seen_second.clone()))
            .await;

        let from_first = SessionId::new();
        let from_second = SessionId::new();
        first.send(sentinel(from_first)).await.unwrap();
        second.send(sentinel(from_second)).await.unwrap();

        // Give the pump tasks their turns
        while seen_first.lock().unwrap().is_empty() || seen_second.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            seen_second.lock().unwrap()[0].session_id(),
            from_first
        );
        assert_eq!(seen_first.lock().unwrap()[0].session_id(), from_second);
    }
}
