use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod ytdlp;

pub use ytdlp::YtDlpFetcher;

/// Identity and metadata of a remote video, resolved before any download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedVideo {
    /// Platform-assigned video id, stable across URL variants
    pub video_id: String,

    /// Video title
    pub title: String,

    /// Id of the publishing channel
    pub channel_id: String,

    /// The URL the video was resolved from
    pub url: String,
}

/// Failures reported by the media-retrieval collaborator
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The content is gone, private, or otherwise not resolvable
    #[error("Video unavailable: {0}")]
    Unavailable(String),

    /// Resolution succeeded but the audio stream could not be retrieved
    #[error("Audio retrieval failed: {0}")]
    Retrieval(String),
}

/// Trait for resolving and downloading remote media
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Resolve a URL to a stable video identity. No side effects.
    async fn resolve(&self, url: &str) -> Result<ResolvedVideo, FetchError>;

    /// Download the audio track of a resolved video to `dest`
    async fn download_audio(&self, video: &ResolvedVideo, dest: &Path) -> Result<(), FetchError>;
}
