use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::fetcher::MediaFetcher;
use crate::ledger::{Ledger, LedgerEntry};
use crate::sources;
use crate::stt::SpeechToText;
use crate::subtitle;
use crate::Result;

/// Outcome of processing one URL through the download pipeline.
///
/// Recoverable failures are outcomes, not errors: the run driver switches on
/// the kind and keeps going. Only storage failures escape as `Err`.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Audio artifact written and ledger entry recorded
    Archived(LedgerEntry),

    /// The video id is already in the ledger; nothing was fetched
    AlreadyArchived(String),

    /// The URL could not be resolved (removed or private content)
    Unavailable { url: String, reason: String },

    /// Resolution succeeded but the download failed; no ledger entry is
    /// written, so the next run retries this item
    FetchFailed { video_id: String, reason: String },
}

/// Outcome of processing one audio file through the transcription pipeline
#[derive(Debug)]
pub enum TranscribeOutcome {
    /// Subtitle artifact written
    Transcribed(String),

    /// A subtitle already exists at the canonical path; the engine was not invoked
    AlreadyTranscribed(String),

    /// Inference failed; no subtitle is written, so the next run retries
    Failed { audio_id: String, reason: String },
}

/// Counts reported at the end of a run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} skipped, {} failed",
            self.completed, self.skipped, self.failed
        )
    }
}

fn run_progress(len: usize) -> ProgressBar {
    let progress = ProgressBar::new(len as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap(),
    );
    progress
}

/// Ledger-gated download pipeline for one run
pub struct DownloadPipeline {
    fetcher: Box<dyn MediaFetcher>,
    ledger: Ledger,
    audio_dir: PathBuf,
    audio_format: String,
}

impl DownloadPipeline {
    pub fn new(
        fetcher: Box<dyn MediaFetcher>,
        ledger: Ledger,
        audio_dir: PathBuf,
        audio_format: String,
    ) -> Self {
        Self {
            fetcher,
            ledger,
            audio_dir,
            audio_format,
        }
    }

    /// Process one URL: resolve its identity, consult the ledger, download the
    /// audio, record the entry.
    ///
    /// The artifact is fully written before the ledger entry is appended, so a
    /// video id is recorded iff its audio exists on disk.
    pub async fn process_url(&self, url: &str) -> Result<DownloadOutcome> {
        let video = match self.fetcher.resolve(url).await {
            Ok(video) => video,
            Err(e) => {
                return Ok(DownloadOutcome::Unavailable {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if self.ledger.exists(&video.video_id)? {
            return Ok(DownloadOutcome::AlreadyArchived(video.video_id));
        }

        let dest = self
            .audio_dir
            .join(format!("{}.{}", video.video_id, self.audio_format));
        if let Err(e) = self.fetcher.download_audio(&video, &dest).await {
            return Ok(DownloadOutcome::FetchFailed {
                video_id: video.video_id,
                reason: e.to_string(),
            });
        }

        let entry = LedgerEntry {
            title: video.title,
            video_id: video.video_id,
            channel_id: video.channel_id,
        };
        self.ledger.append(&entry)?;

        Ok(DownloadOutcome::Archived(entry))
    }

    /// Run the pipeline over every URL, isolating per-item failures
    pub async fn run(&self, urls: &[String]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let progress = run_progress(urls.len());

        for url in urls {
            progress.set_message(url.clone());

            match self.process_url(url).await? {
                DownloadOutcome::Archived(entry) => {
                    info!("Archived {} ({})", entry.video_id, entry.title);
                    summary.completed += 1;
                }
                DownloadOutcome::AlreadyArchived(video_id) => {
                    info!("{} already exists. skip downloading.", video_id);
                    summary.skipped += 1;
                }
                DownloadOutcome::Unavailable { url, reason } => {
                    warn!("Skipping unavailable video {}: {}", url, reason);
                    summary.failed += 1;
                }
                DownloadOutcome::FetchFailed { video_id, reason } => {
                    warn!("Failed to download {}: {}", video_id, reason);
                    summary.failed += 1;
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(summary)
    }
}

/// Transcription pipeline for one run.
///
/// Identity is nominal: the audio file's name stem is the video id, and an
/// existing subtitle at the canonical path is the "already done" signal.
pub struct TranscriptionPipeline {
    stt: Box<dyn SpeechToText>,
    subtitle_dir: PathBuf,
}

impl TranscriptionPipeline {
    pub fn new(stt: Box<dyn SpeechToText>, subtitle_dir: PathBuf) -> Self {
        Self { stt, subtitle_dir }
    }

    /// Transcribe one audio file unless its subtitle already exists
    pub async fn process_audio(&self, audio_path: &Path) -> Result<TranscribeOutcome> {
        let audio_id = audio_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("Invalid audio filename: {}", audio_path.display()))?;

        let subtitle_path = self.subtitle_dir.join(format!("{}.vtt", audio_id));
        if subtitle_path.exists() {
            return Ok(TranscribeOutcome::AlreadyTranscribed(audio_id));
        }

        let segments = match self.stt.transcribe(audio_path).await {
            Ok(segments) => segments,
            Err(e) => {
                return Ok(TranscribeOutcome::Failed {
                    audio_id,
                    reason: e.to_string(),
                })
            }
        };

        subtitle::write_vtt(&segments, &subtitle_path)?;
        Ok(TranscribeOutcome::Transcribed(audio_id))
    }

    /// Run the pipeline over every audio file, isolating per-item failures
    pub async fn run(&self, audio_paths: &[PathBuf]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let progress = run_progress(audio_paths.len());

        for audio_path in audio_paths {
            progress.set_message(audio_path.display().to_string());

            match self.process_audio(audio_path).await? {
                TranscribeOutcome::Transcribed(audio_id) => {
                    info!("Finished transcribing {}", audio_id);
                    summary.completed += 1;
                }
                TranscribeOutcome::AlreadyTranscribed(audio_id) => {
                    info!("{} already exists. skip transcribing.", audio_id);
                    summary.skipped += 1;
                }
                TranscribeOutcome::Failed { audio_id, reason } => {
                    warn!("Failed to transcribe {}: {}", audio_id, reason);
                    summary.failed += 1;
                }
            }

            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(summary)
    }
}

/// Run the download pipeline end to end: enumerate the URL list, then set up
/// the ledger and audio directory, then process sequentially.
///
/// Enumeration happens first so a missing or empty list aborts before any
/// ledger or artifact writes.
pub async fn run_download(config: &Config, fetcher: Box<dyn MediaFetcher>) -> Result<RunSummary> {
    let started = Instant::now();

    let url_list_path = config.storage.url_list_path();
    let urls = sources::url_list(&url_list_path)?;
    info!("Loaded {} URLs from {}", urls.len(), url_list_path.display());

    let ledger = Ledger::new(config.storage.ledger_path());
    ledger.initialize()?;
    let audio_dir = config.storage.audio_dir_path();
    fs_err::create_dir_all(&audio_dir)?;

    let pipeline = DownloadPipeline::new(
        fetcher,
        ledger,
        audio_dir,
        config.download.audio_format.clone(),
    );
    let summary = pipeline.run(&urls).await?;

    info!(
        "Download run finished in {:.1}s: {}",
        started.elapsed().as_secs_f64(),
        summary
    );
    Ok(summary)
}

/// Run the transcription pipeline end to end over the audio directory
pub async fn run_transcription(config: &Config, stt: Box<dyn SpeechToText>) -> Result<RunSummary> {
    let started = Instant::now();

    let audio_dir = config.storage.audio_dir_path();
    let audio_paths = sources::audio_files(&audio_dir)?;
    info!("Found {} audio files in {}", audio_paths.len(), audio_dir.display());

    let subtitle_dir = config.storage.subtitle_dir_path();
    fs_err::create_dir_all(&subtitle_dir)?;

    let pipeline = TranscriptionPipeline::new(stt, subtitle_dir);
    let summary = pipeline.run(&audio_paths).await?;

    info!(
        "Transcription run finished in {:.1}s: {}",
        started.elapsed().as_secs_f64(),
        summary
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchError, MockMediaFetcher, ResolvedVideo};
    use crate::stt::{MockSpeechToText, Segment};
    use std::ffi::OsStr;

    fn resolved(video_id: &str, url: &str) -> ResolvedVideo {
        ResolvedVideo {
            video_id: video_id.to_string(),
            title: format!("Title of {}", video_id),
            channel_id: "chan1".to_string(),
            url: url.to_string(),
        }
    }

    fn resolve_by_url(url: &str) -> std::result::Result<ResolvedVideo, FetchError> {
        if url.contains("u1") {
            Ok(resolved("id1", url))
        } else {
            Ok(resolved("id2", url))
        }
    }

    struct DownloadFixture {
        _dir: tempfile::TempDir,
        ledger: Ledger,
        audio_dir: PathBuf,
    }

    fn download_fixture() -> DownloadFixture {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("audio_meta.csv"));
        ledger.initialize().unwrap();
        let audio_dir = dir.path().join("audios");
        fs_err::create_dir_all(&audio_dir).unwrap();
        DownloadFixture {
            _dir: dir,
            ledger,
            audio_dir,
        }
    }

    fn pipeline_with(fixture: &DownloadFixture, fetcher: MockMediaFetcher) -> DownloadPipeline {
        DownloadPipeline::new(
            Box::new(fetcher),
            fixture.ledger.clone(),
            fixture.audio_dir.clone(),
            "mp3".to_string(),
        )
    }

    #[tokio::test]
    async fn repeated_urls_produce_one_entry_and_two_fetches() {
        let fixture = download_fixture();

        let mut fetcher = MockMediaFetcher::new();
        fetcher.expect_resolve().times(3).returning(resolve_by_url);
        fetcher
            .expect_download_audio()
            .times(2)
            .returning(|_, dest| {
                std::fs::write(dest, b"audio").unwrap();
                Ok(())
            });

        let urls = vec![
            "https://youtu.be/u1".to_string(),
            "https://youtu.be/u2".to_string(),
            "https://youtu.be/u1?t=42".to_string(),
        ];
        let pipeline = pipeline_with(&fixture, fetcher);
        let summary = pipeline.run(&urls).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                completed: 2,
                skipped: 1,
                failed: 0
            }
        );
        let ids: Vec<_> = fixture
            .ledger
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.video_id)
            .collect();
        assert_eq!(ids, vec!["id1", "id2"]);
    }

    #[tokio::test]
    async fn second_run_performs_no_fetches() {
        let fixture = download_fixture();

        let mut fetcher = MockMediaFetcher::new();
        // Two runs over two URLs: four resolutions, but only two downloads.
        fetcher.expect_resolve().times(4).returning(resolve_by_url);
        fetcher
            .expect_download_audio()
            .times(2)
            .returning(|_, dest| {
                std::fs::write(dest, b"audio").unwrap();
                Ok(())
            });

        let urls = vec![
            "https://youtu.be/u1".to_string(),
            "https://youtu.be/u2".to_string(),
        ];
        let pipeline = pipeline_with(&fixture, fetcher);

        let first = pipeline.run(&urls).await.unwrap();
        let second = pipeline.run(&urls).await.unwrap();

        assert_eq!(first.completed, 2);
        assert_eq!(
            second,
            RunSummary {
                completed: 0,
                skipped: 2,
                failed: 0
            }
        );
        assert_eq!(fixture.ledger.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn dedup_is_order_independent_for_url_aliases() {
        for order in [["u1", "u1?feature=share"], ["u1?feature=share", "u1"]] {
            let fixture = download_fixture();

            let mut fetcher = MockMediaFetcher::new();
            fetcher.expect_resolve().times(2).returning(resolve_by_url);
            fetcher
                .expect_download_audio()
                .times(1)
                .returning(|_, dest| {
                    std::fs::write(dest, b"audio").unwrap();
                    Ok(())
                });

            let urls: Vec<String> = order
                .iter()
                .map(|u| format!("https://youtu.be/{}", u))
                .collect();
            let pipeline = pipeline_with(&fixture, fetcher);
            let summary = pipeline.run(&urls).await.unwrap();

            assert_eq!(summary.completed, 1);
            assert_eq!(summary.skipped, 1);
            assert_eq!(fixture.ledger.len().unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn failed_download_leaves_no_ledger_entry() {
        let fixture = download_fixture();

        let mut fetcher = MockMediaFetcher::new();
        fetcher.expect_resolve().times(1).returning(resolve_by_url);
        fetcher
            .expect_download_audio()
            .times(1)
            .returning(|_, _| Err(FetchError::Retrieval("connection reset".to_string())));

        let pipeline = pipeline_with(&fixture, fetcher);
        let outcome = pipeline.process_url("https://youtu.be/u1").await.unwrap();

        assert!(matches!(outcome, DownloadOutcome::FetchFailed { .. }));
        assert!(!fixture.ledger.exists("id1").unwrap());
    }

    #[tokio::test]
    async fn unavailable_item_does_not_stop_the_run() {
        let fixture = download_fixture();

        let mut fetcher = MockMediaFetcher::new();
        fetcher
            .expect_resolve()
            .withf(|url: &str| url.contains("dead"))
            .returning(|_| Err(FetchError::Unavailable("Private video".to_string())));
        fetcher
            .expect_resolve()
            .withf(|url: &str| url.contains("u2"))
            .returning(resolve_by_url);
        fetcher
            .expect_download_audio()
            .times(1)
            .returning(|_, dest| {
                std::fs::write(dest, b"audio").unwrap();
                Ok(())
            });

        let urls = vec![
            "https://youtu.be/dead".to_string(),
            "https://youtu.be/u2".to_string(),
        ];
        let pipeline = pipeline_with(&fixture, fetcher);
        let summary = pipeline.run(&urls).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                completed: 1,
                skipped: 0,
                failed: 1
            }
        );
        assert!(fixture.ledger.exists("id2").unwrap());
        assert!(!fixture.ledger.exists("id1").unwrap());
    }

    #[tokio::test]
    async fn skipped_duplicate_never_downloads() {
        let fixture = download_fixture();
        fixture
            .ledger
            .append(&LedgerEntry {
                title: "Title of id1".to_string(),
                video_id: "id1".to_string(),
                channel_id: "chan1".to_string(),
            })
            .unwrap();

        let mut fetcher = MockMediaFetcher::new();
        fetcher.expect_resolve().times(1).returning(resolve_by_url);
        fetcher.expect_download_audio().never();

        let pipeline = pipeline_with(&fixture, fetcher);
        let outcome = pipeline.process_url("https://youtu.be/u1").await.unwrap();

        assert!(matches!(outcome, DownloadOutcome::AlreadyArchived(id) if id == "id1"));
    }

    #[tokio::test]
    async fn existing_subtitle_skips_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let subtitle_dir = dir.path().join("subtitles");
        fs_err::create_dir_all(&subtitle_dir).unwrap();
        fs_err::write(subtitle_dir.join("id1.vtt"), "WEBVTT\n\n").unwrap();

        let mut stt = MockSpeechToText::new();
        stt.expect_transcribe().never();

        let pipeline = TranscriptionPipeline::new(Box::new(stt), subtitle_dir);
        let outcome = pipeline
            .process_audio(Path::new("audios/id1.mp3"))
            .await
            .unwrap();

        assert!(matches!(outcome, TranscribeOutcome::AlreadyTranscribed(id) if id == "id1"));
    }

    #[tokio::test]
    async fn transcription_writes_subtitle_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let subtitle_dir = dir.path().join("subtitles");
        fs_err::create_dir_all(&subtitle_dir).unwrap();

        let mut stt = MockSpeechToText::new();
        stt.expect_transcribe().times(1).returning(|_| {
            Ok(vec![Segment {
                start: 0.0,
                end: 1.5,
                text: "hello".to_string(),
            }])
        });

        let pipeline = TranscriptionPipeline::new(Box::new(stt), subtitle_dir.clone());
        let outcome = pipeline
            .process_audio(Path::new("audios/id1.mp3"))
            .await
            .unwrap();

        assert!(matches!(outcome, TranscribeOutcome::Transcribed(id) if id == "id1"));
        let content = fs_err::read_to_string(subtitle_dir.join("id1.vtt")).unwrap();
        assert!(content.starts_with("WEBVTT"));
        assert!(content.contains("hello"));
    }

    #[tokio::test]
    async fn inference_failure_skips_item_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let subtitle_dir = dir.path().join("subtitles");
        fs_err::create_dir_all(&subtitle_dir).unwrap();

        let mut stt = MockSpeechToText::new();
        stt.expect_transcribe()
            .withf(|path: &Path| path.file_stem() == Some(OsStr::new("bad")))
            .returning(|_| Err(anyhow::anyhow!("inference crashed")));
        stt.expect_transcribe()
            .withf(|path: &Path| path.file_stem() == Some(OsStr::new("good")))
            .returning(|_| {
                Ok(vec![Segment {
                    start: 0.0,
                    end: 1.0,
                    text: "ok".to_string(),
                }])
            });

        let audio_paths = vec![PathBuf::from("audios/bad.mp3"), PathBuf::from("audios/good.mp3")];
        let pipeline = TranscriptionPipeline::new(Box::new(stt), subtitle_dir.clone());
        let summary = pipeline.run(&audio_paths).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                completed: 1,
                skipped: 0,
                failed: 1
            }
        );
        assert!(!subtitle_dir.join("bad.vtt").exists());
        assert!(subtitle_dir.join("good.vtt").exists());
    }

    #[tokio::test]
    async fn missing_url_list_aborts_before_any_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_path_buf();

        let fetcher = MockMediaFetcher::new();
        let result = run_download(&config, Box::new(fetcher)).await;

        assert!(result.is_err());
        assert!(!config.storage.ledger_path().exists());
        assert!(!config.storage.audio_dir_path().exists());
    }
}
