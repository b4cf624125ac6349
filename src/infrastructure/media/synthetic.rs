//! Synthetic capture devices
//!
//! Stands in for real camera/microphone capture: produces labeled live
//! tracks matching the requested constraints without touching any hardware.

use crate::domain::negotiation::media::{MediaHandle, MediaKind, MediaSource, MediaTrack};
use crate::domain::negotiation::value_object::MediaConstraints;
use crate::domain::shared::error::NegotiationError;
use crate::domain::shared::result::Result;
use async_trait::async_trait;
use tracing::info;

pub struct SyntheticCamera {
    video_label: String,
    audio_label: String,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self {
            video_label: "Synthetic Camera".to_string(),
            audio_label: "Synthetic Microphone".to_string(),
        }
    }

    pub fn with_labels(video_label: impl Into<String>, audio_label: impl Into<String>) -> Self {
        Self {
            video_label: video_label.into(),
            audio_label: audio_label.into(),
        }
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaSource for SyntheticCamera {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<MediaHandle> {
        if constraints.is_empty() {
            return Err(NegotiationError::NoDevice);
        }

        let mut tracks = Vec::new();
        if constraints.audio {
            info!("using audio device: {}", self.audio_label);
            tracks.push(MediaTrack::new(MediaKind::Audio, self.audio_label.clone()));
        }
        if constraints.video {
            info!("using video device: {}", self.video_label);
            tracks.push(MediaTrack::new(MediaKind::Video, self.video_label.clone()));
        }
        Ok(MediaHandle::new(tracks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_honors_constraints() {
        let source = SyntheticCamera::new();

        let video = source
            .acquire(&MediaConstraints::video_only())
            .await
            .unwrap();
        assert!(video.has_video());
        assert!(!video.has_audio());

        let both = source
            .acquire(&MediaConstraints::video_and_audio())
            .await
            .unwrap();
        assert_eq!(both.tracks().len(), 2);
    }

    #[test]
    fn test_empty_constraints_have_no_device() {
        let source = SyntheticCamera::new();
        let result = tokio_test::block_on(source.acquire(&MediaConstraints {
            video: false,
            audio: false,
        }));
        assert_eq!(result, Err(NegotiationError::NoDevice));
    }
}
