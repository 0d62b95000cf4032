use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{FetchError, MediaFetcher, ResolvedVideo};
use crate::config::DownloadConfig;

/// Media fetcher backed by the yt-dlp command line tool
pub struct YtDlpFetcher {
    config: DownloadConfig,
}

impl YtDlpFetcher {
    pub fn new(config: DownloadConfig) -> Self {
        Self { config }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.config.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn resolve(&self, url: &str) -> Result<ResolvedVideo, FetchError> {
        tracing::debug!("Resolving video info for: {}", url);

        let output = Command::new(&self.config.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", "--skip-download", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| FetchError::Unavailable(format!("failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Unavailable(stderr.trim().to_string()));
        }

        let info: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| FetchError::Unavailable(format!("unparsable yt-dlp output: {}", e)))?;

        let video_id = info["id"]
            .as_str()
            .ok_or_else(|| FetchError::Unavailable("no video id in yt-dlp output".to_string()))?
            .to_string();

        Ok(ResolvedVideo {
            video_id,
            title: info["title"].as_str().unwrap_or("").to_string(),
            channel_id: info["channel_id"].as_str().unwrap_or("").to_string(),
            url: url.to_string(),
        })
    }

    async fn download_audio(&self, video: &ResolvedVideo, dest: &Path) -> Result<(), FetchError> {
        tracing::debug!("Downloading audio for {} to {}", video.video_id, dest.display());

        let dest_str = dest.to_string_lossy();
        let output = Command::new(&self.config.yt_dlp_path)
            .args([
                "--output",
                dest_str.as_ref(),
                "--extract-audio",
                "--audio-format",
                self.config.audio_format.as_str(),
                "--format",
                "bestaudio/best",
                "--no-playlist",
                video.url.as_str(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| FetchError::Retrieval(format!("failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Retrieval(stderr.trim().to_string()));
        }

        Ok(())
    }
}
