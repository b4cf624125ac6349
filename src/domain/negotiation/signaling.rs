//! Signaling Channel port
//!
//! The channel delivers serialized descriptions and candidates between the
//! two sides. Delivery order and reliability are not guaranteed (the
//! manual-exchange variant is a human with a clipboard), so consumers must
//! tolerate out-of-order candidates.

use crate::domain::negotiation::value_object::{EndpointRole, SessionDescription};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::SessionId;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Signaling message types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalingMessage {
    /// SDP offer
    Offer {
        session_id: SessionId,
        from: EndpointRole,
        description: SessionDescription,
    },
    /// SDP answer
    Answer {
        session_id: SessionId,
        from: EndpointRole,
        description: SessionDescription,
    },
    /// Connectivity candidate in SDP attribute form; `None` marks
    /// end-of-gathering for the sender
    Candidate {
        session_id: SessionId,
        from: EndpointRole,
        candidate: Option<String>,
    },
}

impl SignalingMessage {
    pub fn session_id(&self) -> SessionId {
        match self {
            SignalingMessage::Offer { session_id, .. }
            | SignalingMessage::Answer { session_id, .. }
            | SignalingMessage::Candidate { session_id, .. } => *session_id,
        }
    }

    pub fn from_role(&self) -> EndpointRole {
        match self {
            SignalingMessage::Offer { from, .. }
            | SignalingMessage::Answer { from, .. }
            | SignalingMessage::Candidate { from, .. } => *from,
        }
    }
}

/// Handler invoked for every delivered message
pub type ReceiveHandler = Box<dyn Fn(SignalingMessage) -> BoxFuture<'static, ()> + Send + Sync>;

/// Port for exchanging signaling messages with the peer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignalingChannel: Send + Sync {
    /// Hand a message to the channel. Ownership of the copy transfers to
    /// the receiving side.
    async fn send(&self, message: SignalingMessage) -> Result<()>;

    /// Register the handler for inbound messages. Messages delivered before
    /// registration are queued, not dropped.
    async fn on_receive(&self, handler: ReceiveHandler);
}
