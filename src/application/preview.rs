//! Local preview use case
//!
//! The simplest flow: acquire the local capture and hand the live handle to
//! the caller. No peer, no negotiation.

use crate::domain::negotiation::media::{MediaHandle, MediaSource};
use crate::domain::negotiation::value_object::MediaConstraints;
use crate::domain::shared::result::Result;
use std::sync::Arc;
use tracing::info;

pub struct LocalPreview {
    media: Arc<dyn MediaSource>,
}

impl LocalPreview {
    pub fn new(media: Arc<dyn MediaSource>) -> Self {
        Self { media }
    }

    pub async fn run(&self, constraints: MediaConstraints) -> Result<MediaHandle> {
        info!("requesting media stream");
        let handle = self.media.acquire(&constraints).await?;
        info!(
            "received local stream with {} track(s)",
            handle.tracks().len()
        );
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::negotiation::media::{MediaKind, MediaTrack, MockMediaSource};
    use crate::domain::shared::error::NegotiationError;

    #[tokio::test]
    async fn test_preview_returns_acquired_handle() {
        let mut media = MockMediaSource::new();
        media.expect_acquire().returning(|constraints| {
            assert!(constraints.video);
            Ok(MediaHandle::new(vec![MediaTrack::new(
                MediaKind::Video,
                "cam",
            )]))
        });

        let preview = LocalPreview::new(Arc::new(media));
        let handle = preview.run(MediaConstraints::video_only()).await.unwrap();
        assert!(handle.has_video());
    }

    #[tokio::test]
    async fn test_preview_propagates_no_device() {
        let mut media = MockMediaSource::new();
        media
            .expect_acquire()
            .returning(|_| Err(NegotiationError::NoDevice));

        let preview = LocalPreview::new(Arc::new(media));
        let result = preview
            .run(MediaConstraints {
                video: false,
                audio: false,
            })
            .await;
        assert_eq!(result, Err(NegotiationError::NoDevice));
    }
}
