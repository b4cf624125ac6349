//! Simulated connectivity evaluation
//!
//! The real transport runs checks against candidate pairs; here the state is
//! derived from the negotiation evidence an endpoint holds. The probe only
//! ever advances one legal step at a time so observers see the full
//! `new -> checking -> connected` walk.

use crate::domain::negotiation::endpoint::Endpoint;
use crate::domain::negotiation::value_object::ConnectivityState;

/// Evidence-based connectivity stepper
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectivityProbe;

impl ConnectivityProbe {
    pub fn new() -> Self {
        Self
    }

    /// The next transition the transport would report for `endpoint`, if
    /// any. Checks start once a remote candidate lands against a remote
    /// description; a usable pair exists once both sides contributed
    /// candidates.
    pub fn next_state(&self, endpoint: &Endpoint) -> Option<ConnectivityState> {
        let has_remote = endpoint.remote_description().is_some()
            && !endpoint.remote_candidates().is_empty();
        let has_pair = has_remote
            && endpoint.local_description().is_some()
            && !endpoint.local_candidates().is_empty();

        match endpoint.connectivity_state() {
            ConnectivityState::New if has_remote => Some(ConnectivityState::Checking),
            ConnectivityState::Checking if has_pair => Some(ConnectivityState::Connected),
            _ => None,
        }
    }
}
