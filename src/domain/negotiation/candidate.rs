//! Connectivity candidate value object
//!
//! Candidates are discovered incrementally after a local description is set
//! and are exchanged as SDP `candidate:` attribute text. They are immutable
//! once produced.

use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Candidate types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateType {
    /// Local interface address
    Host,
    /// Public address discovered via STUN
    ServerReflexive,
    /// Discovered during connectivity checks
    PeerReflexive,
    /// Address on a TURN relay
    Relay,
}

impl CandidateType {
    pub fn priority_preference(&self) -> u32 {
        match self {
            CandidateType::Host => 126,
            CandidateType::PeerReflexive => 110,
            CandidateType::ServerReflexive => 100,
            CandidateType::Relay => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateType::Host => "host",
            CandidateType::ServerReflexive => "srflx",
            CandidateType::PeerReflexive => "prflx",
            CandidateType::Relay => "relay",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "host" => Some(CandidateType::Host),
            "srflx" => Some(CandidateType::ServerReflexive),
            "prflx" => Some(CandidateType::PeerReflexive),
            "relay" => Some(CandidateType::Relay),
            _ => None,
        }
    }
}

/// A discovered network path usable for the direct transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceCandidate {
    /// Groups candidates gathered from the same source
    pub foundation: String,
    /// Component ID (1 = RTP, 2 = RTCP)
    pub component: u16,
    pub priority: u32,
    pub address: SocketAddr,
    pub candidate_type: CandidateType,
    /// Base address for reflexive candidates
    pub related_address: Option<SocketAddr>,
}

impl IceCandidate {
    pub fn new(candidate_type: CandidateType, address: SocketAddr, component: u16) -> Self {
        Self {
            foundation: format!("{}{}", candidate_type.priority_preference(), component),
            component,
            priority: Self::compute_priority(candidate_type, component),
            address,
            candidate_type,
            related_address: None,
        }
    }

    pub fn with_related_address(mut self, related: SocketAddr) -> Self {
        self.related_address = Some(related);
        self
    }

    /// Priority per RFC 5245:
    /// (2^24)*(type preference) + (2^8)*(local preference) + (256 - component ID)
    pub fn compute_priority(candidate_type: CandidateType, component: u16) -> u32 {
        let type_pref = candidate_type.priority_preference();
        let local_pref = 65535u32;
        (1 << 24) * type_pref + (1 << 8) * local_pref + (256 - component as u32)
    }

    /// Render as an SDP attribute value.
    /// Example: `candidate:1261 1 UDP 2130706431 192.168.1.100 5000 typ host`
    pub fn to_attribute(&self) -> String {
        let mut attr = format!(
            "candidate:{} {} UDP {} {} {} typ {}",
            self.foundation,
            self.component,
            self.priority,
            self.address.ip(),
            self.address.port(),
            self.candidate_type.as_str(),
        );
        if let Some(related) = self.related_address {
            attr.push_str(&format!(" raddr {} rport {}", related.ip(), related.port()));
        }
        attr
    }

    /// Parse an SDP attribute value. Malformed input yields
    /// `InvalidCandidate` carrying the offending text.
    pub fn from_attribute(attr: &str) -> Result<Self> {
        let invalid = || NegotiationError::InvalidCandidate(attr.to_string());

        let parts: Vec<&str> = attr.split_whitespace().collect();
        if parts.len() < 8 {
            return Err(invalid());
        }

        let foundation = parts[0].strip_prefix("candidate:").ok_or_else(invalid)?;
        if foundation.is_empty() {
            return Err(invalid());
        }
        let component: u16 = parts[1].parse().map_err(|_| invalid())?;
        if !parts[2].eq_ignore_ascii_case("udp") {
            return Err(invalid());
        }
        let priority: u32 = parts[3].parse().map_err(|_| invalid())?;
        let address: SocketAddr = format!("{}:{}", parts[4], parts[5])
            .parse()
            .map_err(|_| invalid())?;

        if parts[6] != "typ" {
            return Err(invalid());
        }
        let candidate_type = CandidateType::from_str(parts[7]).ok_or_else(invalid)?;

        let related_address = match (
            parts.iter().position(|p| *p == "raddr"),
            parts.iter().position(|p| *p == "rport"),
        ) {
            (Some(ri), Some(pi)) => {
                let ip = parts.get(ri + 1).ok_or_else(invalid)?;
                let port = parts.get(pi + 1).ok_or_else(invalid)?;
                Some(
                    format!("{}:{}", ip, port)
                        .parse()
                        .map_err(|_| invalid())?,
                )
            }
            (None, None) => None,
            _ => return Err(invalid()),
        };

        Ok(Self {
            foundation: foundation.to_string(),
            component,
            priority,
            address,
            candidate_type,
            related_address,
        })
    }
}

impl fmt::Display for IceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_attribute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_creation() {
        let addr: SocketAddr = "192.168.1.100:5000".parse().unwrap();
        let candidate = IceCandidate::new(CandidateType::Host, addr, 1);

        assert_eq!(candidate.address, addr);
        assert_eq!(candidate.component, 1);
        assert_eq!(candidate.candidate_type, CandidateType::Host);
    }

    #[test]
    fn test_priority_ordering() {
        let host = IceCandidate::compute_priority(CandidateType::Host, 1);
        let srflx = IceCandidate::compute_priority(CandidateType::ServerReflexive, 1);
        let relay = IceCandidate::compute_priority(CandidateType::Relay, 1);
        assert!(host > srflx);
        assert!(srflx > relay);
    }

    #[test]
    fn test_attribute_round_trip() {
        let addr: SocketAddr = "192.168.1.100:5000".parse().unwrap();
        let candidate = IceCandidate::new(CandidateType::Host, addr, 1);

        let attr = candidate.to_attribute();
        assert!(attr.starts_with("candidate:"));
        assert!(attr.contains("typ host"));

        let parsed = IceCandidate::from_attribute(&attr).unwrap();
        assert_eq!(parsed, candidate);
    }

    #[test]
    fn test_related_address_round_trip() {
        let addr: SocketAddr = "203.0.113.7:45000".parse().unwrap();
        let base: SocketAddr = "192.168.1.100:5000".parse().unwrap();
        let candidate =
            IceCandidate::new(CandidateType::ServerReflexive, addr, 1).with_related_address(base);

        let parsed = IceCandidate::from_attribute(&candidate.to_attribute()).unwrap();
        assert_eq!(parsed.related_address, Some(base));
        assert_eq!(parsed.candidate_type, CandidateType::ServerReflexive);
    }

    #[test]
    fn test_malformed_attributes_rejected() {
        for attr in [
            "",
            "candidate:",
            "nonsense",
            "candidate:1 1 UDP 99 192.168.1.1 5000",
            "candidate:1 x UDP 99 192.168.1.1 5000 typ host",
            "candidate:1 1 TCP 99 192.168.1.1 5000 typ host",
            "candidate:1 1 UDP 99 not-an-ip 5000 typ host",
            "candidate:1 1 UDP 99 192.168.1.1 5000 typ bogus",
        ] {
            assert!(
                matches!(
                    IceCandidate::from_attribute(attr),
                    Err(NegotiationError::InvalidCandidate(_))
                ),
                "expected rejection of {attr:?}"
            );
        }
    }
}
