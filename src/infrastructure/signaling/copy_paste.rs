//! Manual copy-paste signaling
//!
//! No signaling server exists in the two-process variant: every message is
//! armored as base64-encoded JSON, shown to the user, and pasted verbatim on
//! the other side. Delivery is neither ordered nor reliable, so candidates
//! may arrive in any order or not at all. A bundle form carries a
//! description together with the candidates gathered so far, so one paste
//! can survive late discovery.

use crate::domain::negotiation::signaling::{ReceiveHandler, SignalingChannel, SignalingMessage};
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;
use tracing::debug;

/// Armor a message for the clipboard
pub fn armor(message: &SignalingMessage) -> String {
    let json = serde_json::to_string(message).expect("message serialization");
    general_purpose::STANDARD.encode(json)
}

/// Decode pasted text back into a message
pub fn dearmor(text: &str) -> Result<SignalingMessage> {
    let bytes = general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|e| NegotiationError::MalformedDescription(e.to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| NegotiationError::MalformedDescription(e.to_string()))
}

/// A description plus the candidates gathered so far, pasted as one blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeBundle {
    pub messages: Vec<SignalingMessage>,
}

impl ExchangeBundle {
    pub fn new(messages: Vec<SignalingMessage>) -> Self {
        Self { messages }
    }

    pub fn armor(&self) -> String {
        let json = serde_json::to_string(self).expect("bundle serialization");
        general_purpose::STANDARD.encode(json)
    }

    pub fn dearmor(text: &str) -> Result<Self> {
        let bytes = general_purpose::STANDARD
            .decode(text.trim())
            .map_err(|e| NegotiationError::MalformedDescription(e.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| NegotiationError::MalformedDescription(e.to_string()))
    }
}

/// Signaling channel backed by a human with a clipboard. Outbound messages
/// pile up in the outbox until the user copies them; inbound text arrives
/// through `paste`.
#[derive(Default)]
pub struct ManualSignaling {
    outbox: StdMutex<Vec<String>>,
    handler: Mutex<Option<Arc<ReceiveHandler>>>,
}

impl ManualSignaling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text blocks waiting to be copied to the peer, oldest first
    pub fn take_outbox(&self) -> Vec<String> {
        std::mem::take(&mut self.outbox.lock().unwrap())
    }

    /// Deliver one pasted text block
    pub async fn paste(&self, text: &str) -> Result<()> {
        let message = dearmor(text)?;
        self.dispatch(message).await
    }

    /// Deliver a pasted bundle, preserving its internal order
    pub async fn paste_bundle(&self, text: &str) -> Result<()> {
        let bundle = ExchangeBundle::dearmor(text)?;
        for message in bundle.messages {
            self.dispatch(message).await?;
        }
        Ok(())
    }

    async fn dispatch(&self, message: SignalingMessage) -> Result<()> {
        let handler = self.handler.lock().await.clone().ok_or_else(|| {
            NegotiationError::ChannelClosed("no receive handler registered".to_string())
        })?;
        handler(message).await;
        Ok(())
    }
}

#[async_trait]
impl SignalingChannel for ManualSignaling {
    async fn send(&self, message: SignalingMessage) -> Result<()> {
        let armored = armor(&message);
        debug!(
            "session {} message armored for copy-paste ({} chars)",
            message.session_id(),
            armored.len()
        );
        self.outbox.lock().unwrap().push(armored);
        Ok(())
    }

    async fn on_receive(&self, handler: ReceiveHandler) {
        *self.handler.lock().await = Some(Arc::new(handler));
    }
}
