use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod whisper;

pub use whisper::WhisperCli;

use crate::Result;

/// One timestamped span of transcribed speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Transcribed text for the span
    pub text: String,
}

/// Trait for converting an audio file into ordered timestamped segments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>>;
}
