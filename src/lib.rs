//! Tubescribe - A Rust CLI tool for building a personal audio archive from YouTube
//!
//! This library provides two ledger-gated batch pipelines: one that downloads the
//! audio track of every video in a URL list via yt-dlp, and one that transcribes
//! the downloaded audio into WebVTT subtitles via the Whisper CLI. Both record or
//! detect completed work so interrupted runs can be safely re-run.

pub mod cli;
pub mod config;
pub mod fetcher;
pub mod ledger;
pub mod pipeline;
pub mod sources;
pub mod stt;
pub mod subtitle;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use fetcher::{FetchError, MediaFetcher, ResolvedVideo};
pub use ledger::{Ledger, LedgerEntry};
pub use pipeline::{
    DownloadOutcome, DownloadPipeline, RunSummary, TranscribeOutcome, TranscriptionPipeline,
};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Structural failures that make an entire run meaningless
#[derive(thiserror::Error, Debug)]
pub enum TubescribeError {
    #[error("Input source not found: {0}")]
    SourceNotFound(String),

    #[error("No work items in input source: {0}")]
    SourceEmpty(String),
}
