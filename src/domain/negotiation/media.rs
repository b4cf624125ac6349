//! Media Source port
//!
//! Capture is outside core scope; the negotiation only needs a live handle
//! whose tracks tell it which media sections to offer. Track lifecycle
//! (stop/release) stays with the Media Source.

use crate::domain::negotiation::value_object::MediaConstraints;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::TrackId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Kinds of media a track can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

/// A single captured track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    pub id: TrackId,
    pub kind: MediaKind,
    /// Device label, e.g. "Synthetic Camera"
    pub label: String,
}

impl MediaTrack {
    pub fn new(kind: MediaKind, label: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            kind,
            label: label.into(),
        }
    }
}

/// Handle to a live capture. Shared read-only between the endpoint and
/// whatever attaches it; cloning does not duplicate the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    tracks: Vec<MediaTrack>,
}

impl MediaHandle {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == MediaKind::Video)
    }

    pub fn has_audio(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == MediaKind::Audio)
    }

    /// The kinds present, in offer order (audio before video)
    pub fn kinds(&self) -> Vec<MediaKind> {
        let mut kinds = Vec::new();
        if self.has_audio() {
            kinds.push(MediaKind::Audio);
        }
        if self.has_video() {
            kinds.push(MediaKind::Video);
        }
        kinds
    }

    pub fn track_labels(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.label.clone()).collect()
    }
}

/// Port for acquiring a local capture handle
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Acquire a capture satisfying `constraints`, failing with `NoDevice`
    /// when no device can
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<MediaHandle>;
}
