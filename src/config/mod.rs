use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// On-disk layout of inputs and artifacts
    pub storage: StorageConfig,

    /// Download pipeline settings
    pub download: DownloadConfig,

    /// Transcription settings
    pub whisper: WhisperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all produced data
    pub data_dir: PathBuf,

    /// URL list file, resolved against `data_dir` unless absolute
    pub url_list: PathBuf,

    /// Ledger file, resolved against `data_dir` unless absolute
    pub ledger: PathBuf,

    /// Audio artifact directory, resolved against `data_dir` unless absolute
    pub audio_dir: PathBuf,

    /// Subtitle artifact directory, resolved against `data_dir` unless absolute
    pub subtitle_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Path to the yt-dlp binary
    pub yt_dlp_path: String,

    /// Container format for downloaded audio artifacts
    pub audio_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    /// Path to the whisper binary
    pub binary_path: String,

    /// Model name passed to whisper
    pub model: String,

    /// Language code (auto-detect when unset)
    pub language: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
                url_list: PathBuf::from("urls.txt"),
                ledger: PathBuf::from("audio_meta.csv"),
                audio_dir: PathBuf::from("audios"),
                subtitle_dir: PathBuf::from("subtitles"),
            },
            download: DownloadConfig {
                yt_dlp_path: "yt-dlp".to_string(),
                audio_format: "mp3".to_string(),
            },
            whisper: WhisperConfig {
                binary_path: "whisper".to_string(),
                model: "large-v2".to_string(),
                language: None,
            },
        }
    }
}

impl StorageConfig {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Path to the URL list input file
    pub fn url_list_path(&self) -> PathBuf {
        self.resolve(&self.url_list)
    }

    /// Path to the ledger store
    pub fn ledger_path(&self) -> PathBuf {
        self.resolve(&self.ledger)
    }

    /// Canonical directory for audio artifacts
    pub fn audio_dir_path(&self) -> PathBuf {
        self.resolve(&self.audio_dir)
    }

    /// Canonical directory for subtitle artifacts
    pub fn subtitle_dir_path(&self) -> PathBuf {
        self.resolve(&self.subtitle_dir)
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config = serde_yaml::from_str(&content)
                .context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("tubescribe").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.download.audio_format.is_empty() {
            anyhow::bail!("Audio format must be configured");
        }

        if self.whisper.model.is_empty() {
            anyhow::bail!("Whisper model must be configured");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Data Directory: {}", self.storage.data_dir.display());
        println!("  URL List: {}", self.storage.url_list_path().display());
        println!("  Ledger: {}", self.storage.ledger_path().display());
        println!("  Audio Directory: {}", self.storage.audio_dir_path().display());
        println!("  Subtitle Directory: {}", self.storage.subtitle_dir_path().display());
        println!("  Audio Format: {}", self.download.audio_format);
        println!("  Whisper Model: {}", self.whisper.model);
        if let Some(language) = &self.whisper.language {
            println!("  Language: {}", language);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_data_dir() {
        let config = Config::default();
        assert_eq!(config.storage.ledger_path(), PathBuf::from("data/audio_meta.csv"));
        assert_eq!(config.storage.audio_dir_path(), PathBuf::from("data/audios"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let mut config = Config::default();
        config.storage.url_list = PathBuf::from("/tmp/urls.txt");
        assert_eq!(config.storage.url_list_path(), PathBuf::from("/tmp/urls.txt"));
    }

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }
}
