use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tubescribe",
    about = "Tubescribe - Archive YouTube audio tracks and generate WebVTT transcripts",
    version,
    long_about = "A CLI tool for building a personal audio archive from YouTube. The download command fetches the audio track of every video in a URL list and records it in a CSV ledger; the transcribe command turns downloaded audio into WebVTT subtitles using Whisper. Both commands skip work that is already done, so they are safe to interrupt and re-run."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the audio track of every URL in the list
    Download {
        /// URL list file, one video URL per line (overrides the configured path)
        #[arg(short, long, value_name = "FILE")]
        list: Option<PathBuf>,

        /// Root data directory (overrides the configured path)
        #[arg(short, long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Transcribe downloaded audio files into WebVTT subtitles
    Transcribe {
        /// Whisper model to use (e.g. tiny, base, large-v2)
        #[arg(short, long, value_name = "NAME")]
        model: Option<String>,

        /// Language code for transcription (auto-detect if not specified)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Root data directory (overrides the configured path)
        #[arg(short, long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Show ledger and artifact counts
    Status {
        /// Root data directory (overrides the configured path)
        #[arg(short, long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Configure paths and external tool settings
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}
