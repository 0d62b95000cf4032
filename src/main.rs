use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubescribe::cli::{Cli, Commands};
use tubescribe::config::Config;
use tubescribe::fetcher::YtDlpFetcher;
use tubescribe::ledger::Ledger;
use tubescribe::pipeline;
use tubescribe::stt::WhisperCli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "tubescribe=debug"
    } else {
        "tubescribe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Download { list, data_dir } => {
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }
            if let Some(list) = list {
                config.storage.url_list = list;
            }

            let fetcher = YtDlpFetcher::new(config.download.clone());
            if !fetcher.check_availability().await {
                eprintln!(
                    "⚠️  yt-dlp not found at '{}' - install it: https://github.com/yt-dlp/yt-dlp",
                    config.download.yt_dlp_path
                );
                eprintln!("   (Continuing anyway - every resolution will fail until it is installed)");
            }

            let summary = pipeline::run_download(&config, Box::new(fetcher)).await?;
            println!("Download finished: {}", summary);
        }

        Commands::Transcribe {
            model,
            language,
            data_dir,
        } => {
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }
            if let Some(model) = model {
                config.whisper.model = model;
            }
            if let Some(language) = language {
                config.whisper.language = Some(language);
            }

            let stt = WhisperCli::new(config.whisper.clone());
            if !stt.check_availability().await {
                eprintln!(
                    "⚠️  whisper not found at '{}' - install it: https://github.com/openai/whisper",
                    config.whisper.binary_path
                );
                eprintln!("   (Continuing anyway - every transcription will fail until it is installed)");
            }

            let summary = pipeline::run_transcription(&config, Box::new(stt)).await?;
            println!("Transcription finished: {}", summary);
        }

        Commands::Status { data_dir } => {
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }

            let ledger = Ledger::new(config.storage.ledger_path());
            let recorded = if ledger.path().exists() { ledger.len()? } else { 0 };

            println!("Ledger entries: {}", recorded);
            println!("Audio artifacts: {}", count_files(&config.storage.audio_dir_path())?);
            println!(
                "Subtitle artifacts: {}",
                count_files(&config.storage.subtitle_dir_path())?
            );
        }

        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Edit the config file to change settings:");
                println!("  {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn count_files(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in fs_err::read_dir(dir)? {
        if entry?.path().is_file() {
            count += 1;
        }
    }
    Ok(count)
}
