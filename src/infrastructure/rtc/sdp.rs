//! SDP document support
//!
//! Builds the description payloads the endpoints exchange and parses the
//! peer's. The grammar covered here is the subset the negotiation needs:
//! session origin, media sections with ICE credentials, rtpmap lines and
//! embedded candidate attributes.

use crate::domain::negotiation::candidate::IceCandidate;
use crate::domain::negotiation::media::MediaKind;
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Media direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDirection {
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl MediaDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaDirection::SendRecv => "sendrecv",
            MediaDirection::SendOnly => "sendonly",
            MediaDirection::RecvOnly => "recvonly",
            MediaDirection::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sendrecv" => Some(MediaDirection::SendRecv),
            "sendonly" => Some(MediaDirection::SendOnly),
            "recvonly" => Some(MediaDirection::RecvOnly),
            "inactive" => Some(MediaDirection::Inactive),
            _ => None,
        }
    }
}

/// RTP codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpCodec {
    pub payload_type: u8,
    pub name: String,
    pub clock_rate: u32,
    pub channels: Option<u8>,
}

impl RtpCodec {
    pub fn new(payload_type: u8, name: impl Into<String>, clock_rate: u32) -> Self {
        Self {
            payload_type,
            name: name.into(),
            clock_rate,
            channels: None,
        }
    }

    /// Opus codec
    pub fn opus() -> Self {
        Self {
            payload_type: 111,
            name: "opus".to_string(),
            clock_rate: 48000,
            channels: Some(2),
        }
    }

    /// PCMU codec
    pub fn pcmu() -> Self {
        Self::new(0, "PCMU", 8000)
    }

    /// VP8 codec
    pub fn vp8() -> Self {
        Self::new(96, "VP8", 90000)
    }

    /// To rtpmap format: "96 VP8/90000"
    pub fn to_rtpmap(&self) -> String {
        if let Some(channels) = self.channels {
            format!(
                "{} {}/{}/{}",
                self.payload_type, self.name, self.clock_rate, channels
            )
        } else {
            format!("{} {}/{}", self.payload_type, self.name, self.clock_rate)
        }
    }

    /// Parse an rtpmap attribute value
    pub fn from_rtpmap(value: &str) -> Option<Self> {
        let (pt, encoding) = value.split_once(' ')?;
        let payload_type = pt.parse().ok()?;
        let mut parts = encoding.split('/');
        let name = parts.next()?.to_string();
        let clock_rate = parts.next()?.parse().ok()?;
        let channels = match parts.next() {
            Some(ch) => Some(ch.parse().ok()?),
            None => None,
        };
        Some(Self {
            payload_type,
            name,
            clock_rate,
            channels,
        })
    }
}

/// One m= section of a description
#[derive(Debug, Clone)]
pub struct MediaSection {
    pub kind: MediaKind,
    pub port: u16,
    pub protocol: String,
    pub codecs: Vec<RtpCodec>,
    pub direction: MediaDirection,
    pub mid: Option<String>,
    pub ice_ufrag: Option<String>,
    pub ice_pwd: Option<String>,
    pub candidates: Vec<IceCandidate>,
    pub rtcp_mux: bool,
}

impl MediaSection {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            port: 9,
            protocol: "UDP/TLS/RTP/SAVPF".to_string(),
            codecs: Vec::new(),
            direction: MediaDirection::SendRecv,
            mid: None,
            ice_ufrag: None,
            ice_pwd: None,
            candidates: Vec::new(),
            rtcp_mux: true,
        }
    }

    pub fn set_ice_credentials(&mut self, ufrag: String, pwd: String) {
        self.ice_ufrag = Some(ufrag);
        self.ice_pwd = Some(pwd);
    }
}

/// A structured session description
#[derive(Debug, Clone)]
pub struct SdpDocument {
    pub session_id: String,
    pub session_version: u64,
    pub origin_username: String,
    pub origin_address: String,
    pub session_name: String,
    pub media: Vec<MediaSection>,
    pub bundle_group: Option<Vec<String>>,
}

impl SdpDocument {
    pub fn new() -> Self {
        Self {
            session_id: random_session_id(),
            session_version: 1,
            origin_username: "-".to_string(),
            origin_address: "0.0.0.0".to_string(),
            session_name: "parley".to_string(),
            media: Vec::new(),
            bundle_group: None,
        }
    }

    pub fn add_media(&mut self, section: MediaSection) {
        self.media.push(section);
    }

    /// Group every mid into one BUNDLE
    pub fn enable_bundle(&mut self) {
        let mids: Vec<String> = self.media.iter().filter_map(|m| m.mid.clone()).collect();
        if !mids.is_empty() {
            self.bundle_group = Some(mids);
        }
    }

    /// Render to SDP text
    pub fn to_sdp_string(&self) -> String {
        let mut sdp = String::new();

        sdp.push_str("v=0\r\n");
        sdp.push_str(&format!(
            "o={} {} {} IN IP4 {}\r\n",
            self.origin_username, self.session_id, self.session_version, self.origin_address
        ));
        sdp.push_str(&format!("s={}\r\n", self.session_name));
        sdp.push_str("t=0 0\r\n");

        if let Some(ref bundle) = self.bundle_group {
            sdp.push_str(&format!("a=group:BUNDLE {}\r\n", bundle.join(" ")));
        }

        for section in &self.media {
            self.render_media(&mut sdp, section);
        }

        sdp
    }

    fn render_media(&self, sdp: &mut String, section: &MediaSection) {
        let payload_types: Vec<String> = section
            .codecs
            .iter()
            .map(|c| c.payload_type.to_string())
            .collect();

        sdp.push_str(&format!(
            "m={} {} {} {}\r\n",
            section.kind.as_str(),
            section.port,
            section.protocol,
            payload_types.join(" ")
        ));
        sdp.push_str("c=IN IP4 0.0.0.0\r\n");

        if section.rtcp_mux {
            sdp.push_str("a=rtcp-mux\r\n");
        }
        if let Some(ref mid) = section.mid {
            sdp.push_str(&format!("a=mid:{}\r\n", mid));
        }
        sdp.push_str(&format!("a={}\r\n", section.direction.as_str()));

        if let Some(ref ufrag) = section.ice_ufrag {
            sdp.push_str(&format!("a=ice-ufrag:{}\r\n", ufrag));
        }
        if let Some(ref pwd) = section.ice_pwd {
            sdp.push_str(&format!("a=ice-pwd:{}\r\n", pwd));
        }

        for codec in &section.codecs {
            sdp.push_str(&format!("a=rtpmap:{}\r\n", codec.to_rtpmap()));
        }
        for candidate in &section.candidates {
            sdp.push_str(&format!("a={}\r\n", candidate.to_attribute()));
        }
    }

    /// Parse SDP text. Unknown attributes are ignored; a missing version
    /// line, origin line or media section is malformed.
    pub fn parse(sdp: &str) -> Result<Self> {
        let malformed =
            |detail: &str| NegotiationError::MalformedDescription(detail.to_string());

        let mut lines = sdp.lines();
        if lines.next().map(str::trim_end) != Some("v=0") {
            return Err(malformed("description must start with v=0"));
        }

        let mut doc = Self::new();
        let mut saw_origin = false;
        let mut current: Option<MediaSection> = None;

        for line in lines {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let (prefix, value) = match line.split_once('=') {
                Some(split) => split,
                None => return Err(malformed("line without '='")),
            };

            match prefix {
                "o" => {
                    let fields: Vec<&str> = value.split_whitespace().collect();
                    if fields.len() != 6 {
                        return Err(malformed("origin line must carry six fields"));
                    }
                    doc.origin_username = fields[0].to_string();
                    doc.session_id = fields[1].to_string();
                    doc.session_version = fields[2]
                        .parse()
                        .map_err(|_| malformed("origin version is not numeric"))?;
                    doc.origin_address = fields[5].to_string();
                    saw_origin = true;
                }
                "s" => doc.session_name = value.to_string(),
                "m" => {
                    if let Some(finished) = current.take() {
                        doc.media.push(finished);
                    }
                    current = Some(Self::parse_media_line(value)?);
                }
                "a" => {
                    if let Some(ref mut section) = current {
                        Self::parse_media_attribute(section, value)?;
                    } else if let Some(mids) = value.strip_prefix("group:BUNDLE ") {
                        doc.bundle_group =
                            Some(mids.split_whitespace().map(str::to_string).collect());
                    }
                }
                // v= handled above; c=, t= and the rest carry nothing we need
                _ => {}
            }
        }
        if let Some(finished) = current.take() {
            doc.media.push(finished);
        }

        if !saw_origin {
            return Err(malformed("missing origin (o=) line"));
        }
        if doc.media.is_empty() {
            return Err(malformed("description carries no media section"));
        }
        Ok(doc)
    }

    fn parse_media_line(value: &str) -> Result<MediaSection> {
        let malformed =
            |detail: &str| NegotiationError::MalformedDescription(detail.to_string());

        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(malformed("media line must carry kind, port and protocol"));
        }
        let kind = match fields[0] {
            "audio" => MediaKind::Audio,
            "video" => MediaKind::Video,
            other => {
                return Err(NegotiationError::MalformedDescription(format!(
                    "unsupported media kind: {other}"
                )))
            }
        };
        let mut section = MediaSection::new(kind);
        section.port = fields[1]
            .parse()
            .map_err(|_| malformed("media port is not numeric"))?;
        section.protocol = fields[2].to_string();
        section.rtcp_mux = false;
        Ok(section)
    }

    fn parse_media_attribute(section: &mut MediaSection, value: &str) -> Result<()> {
        if let Some(mid) = value.strip_prefix("mid:") {
            section.mid = Some(mid.to_string());
        } else if let Some(ufrag) = value.strip_prefix("ice-ufrag:") {
            section.ice_ufrag = Some(ufrag.to_string());
        } else if let Some(pwd) = value.strip_prefix("ice-pwd:") {
            section.ice_pwd = Some(pwd.to_string());
        } else if let Some(rtpmap) = value.strip_prefix("rtpmap:") {
            if let Some(codec) = RtpCodec::from_rtpmap(rtpmap) {
                section.codecs.push(codec);
            }
        } else if value.starts_with("candidate:") {
            section.candidates.push(IceCandidate::from_attribute(value)?);
        } else if value == "rtcp-mux" {
            section.rtcp_mux = true;
        } else if let Some(direction) = MediaDirection::from_str(value) {
            section.direction = direction;
        }
        Ok(())
    }
}

impl Default for SdpDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an offer carrying one media section per requested kind
pub fn build_offer(kinds: &[MediaKind], ice_ufrag: String, ice_pwd: String) -> SdpDocument {
    let mut offer = SdpDocument::new();

    for (index, kind) in kinds.iter().enumerate() {
        let mut section = MediaSection::new(*kind);
        section.mid = Some(index.to_string());
        section.set_ice_credentials(ice_ufrag.clone(), ice_pwd.clone());
        match kind {
            MediaKind::Audio => {
                section.codecs.push(RtpCodec::opus());
                section.codecs.push(RtpCodec::pcmu());
            }
            MediaKind::Video => {
                section.codecs.push(RtpCodec::vp8());
            }
        }
        offer.add_media(section);
    }

    offer.enable_bundle();
    offer
}

/// Build an answer mirroring the offer's media sections under our own
/// credentials
pub fn build_answer(offer: &SdpDocument, ice_ufrag: String, ice_pwd: String) -> SdpDocument {
    let mut answer = SdpDocument::new();

    for remote in &offer.media {
        let mut section = MediaSection::new(remote.kind);
        section.mid = remote.mid.clone();
        section.set_ice_credentials(ice_ufrag.clone(), ice_pwd.clone());
        section.codecs = remote.codecs.clone();
        answer.add_media(section);
    }

    answer.enable_bundle();
    answer
}

/// Random ICE username fragment
pub fn random_ice_ufrag() -> String {
    random_token(8)
}

/// Random ICE password
pub fn random_ice_pwd() -> String {
    random_token(24)
}

fn random_session_id() -> String {
    rand::thread_rng().gen_range(1_000_000_000u64..10_000_000_000).to_string()
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
