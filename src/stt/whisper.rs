use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{Segment, SpeechToText};
use crate::config::WhisperConfig;
use crate::Result;

/// Speech-to-text engine backed by the OpenAI Whisper command line tool
pub struct WhisperCli {
    config: WhisperConfig,
}

impl WhisperCli {
    pub fn new(config: WhisperConfig) -> Self {
        Self { config }
    }

    /// Check if the whisper binary is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.config.binary_path)
            .arg("--help")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl SpeechToText for WhisperCli {
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>> {
        // Whisper writes one output file per input into --output_dir; use a
        // temp dir so partial results never land next to the real artifacts.
        let output_dir = tempfile::tempdir()
            .context("Failed to create temporary output directory")?;

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .args(["--model", self.config.model.as_str()])
            .arg("--output_dir")
            .arg(output_dir.path())
            .args(["--output_format", "json"]);

        if let Some(language) = &self.config.language {
            cmd.args(["--language", language.as_str()]);
        }

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context("Failed to execute whisper")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Whisper failed: {}", stderr.trim());
        }

        let stem = audio_path
            .file_stem()
            .ok_or_else(|| anyhow::anyhow!("Invalid audio filename: {}", audio_path.display()))?;
        let json_path = output_dir.path().join(format!("{}.json", stem.to_string_lossy()));

        let content = fs_err::read_to_string(&json_path)
            .context("Failed to read whisper output")?;
        let parsed: Value = serde_json::from_str(&content)
            .context("Failed to parse whisper output")?;

        let segments = parsed["segments"]
            .as_array()
            .map(|segments| {
                segments
                    .iter()
                    .map(|segment| Segment {
                        start: segment["start"].as_f64().unwrap_or(0.0),
                        end: segment["end"].as_f64().unwrap_or(0.0),
                        text: segment["text"].as_str().unwrap_or("").to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(segments)
    }
}
