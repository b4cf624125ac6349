//! Observer port
//!
//! The observer receives every recorded negotiation event and every reported
//! error. UI concerns (button enable/disable) stay on the other side of this
//! interface.

use crate::domain::negotiation::event::NegotiationEvent;
use crate::domain::shared::error::NegotiationError;

/// Port for surfacing negotiation progress and tolerated failures
#[cfg_attr(test, mockall::automock)]
pub trait NegotiationObserver: Send + Sync {
    fn on_event(&self, event: &NegotiationEvent);

    fn on_error(&self, error: &NegotiationError);
}
