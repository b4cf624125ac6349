//! Simulated candidate gathering
//!
//! No sockets are opened: the gatherer fabricates one host candidate per
//! media section, plus a server-reflexive candidate when STUN servers are
//! configured, from the documentation address ranges. Discovery is async the
//! way the real thing is; callers follow the batch with the end-of-gathering
//! sentinel.

use crate::domain::negotiation::candidate::{CandidateType, IceCandidate};
use crate::infrastructure::rtc::sdp::SdpDocument;
use rand::Rng;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Fabricates candidates for the endpoint that just set its local
/// description
#[derive(Debug, Clone)]
pub struct CandidateGatherer {
    stun_servers: Vec<String>,
}

impl CandidateGatherer {
    pub fn new(stun_servers: Vec<String>) -> Self {
        Self { stun_servers }
    }

    /// Discover candidates for every media section of `description`.
    /// Returned in discovery order; the caller appends the sentinel.
    pub async fn gather(&self, description: &SdpDocument) -> Vec<IceCandidate> {
        let mut rng = rand::thread_rng();
        let mut candidates = Vec::new();

        for _ in &description.media {
            let host_addr = SocketAddr::new(
                IpAddr::V4(Ipv4Addr::new(192, 168, 1, rng.gen_range(2..250))),
                rng.gen_range(16384..32768),
            );
            candidates.push(IceCandidate::new(CandidateType::Host, host_addr, 1));

            // Reflexive discovery needs a STUN server to answer
            if !self.stun_servers.is_empty() {
                let reflexive_addr = SocketAddr::new(
                    IpAddr::V4(Ipv4Addr::new(203, 0, 113, rng.gen_range(2..250))),
                    rng.gen_range(32768..60999),
                );
                candidates.push(
                    IceCandidate::new(CandidateType::ServerReflexive, reflexive_addr, 1)
                        .with_related_address(host_addr),
                );
            }
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::negotiation::media::MediaKind;
    use crate::infrastructure::rtc::sdp::build_offer;

    #[tokio::test]
    async fn test_gather_per_section() {
        let offer = build_offer(
            &[MediaKind::Audio, MediaKind::Video],
            "uf".into(),
            "pw".into(),
        );

        let gatherer = CandidateGatherer::new(vec!["stun:stun1.l.google.com:19302".into()]);
        let candidates = gatherer.gather(&offer).await;

        // host + srflx per section
        assert_eq!(candidates.len(), 4);
        assert!(candidates
            .iter()
            .any(|c| c.candidate_type == CandidateType::ServerReflexive));
        assert!(candidates
            .iter()
            .filter(|c| c.candidate_type == CandidateType::ServerReflexive)
            .all(|c| c.related_address.is_some()));
    }

    #[tokio::test]
    async fn test_no_stun_means_host_only() {
        let offer = build_offer(&[MediaKind::Video], "uf".into(), "pw".into());
        let gatherer = CandidateGatherer::new(Vec::new());
        let candidates = gatherer.gather(&offer).await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].candidate_type, CandidateType::Host);
    }
}
