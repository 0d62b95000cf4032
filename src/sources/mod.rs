use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

use crate::{Result, TubescribeError};

/// Enumerate candidate URLs from the list file: one per line, blank lines
/// ignored. A missing file or a list with no usable URLs aborts the run.
pub fn url_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(TubescribeError::SourceNotFound(path.display().to_string()).into());
    }

    let content = fs_err::read_to_string(path)?;

    let mut urls = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match Url::parse(line) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                urls.push(line.to_string());
            }
            _ => warn!("Ignoring malformed URL line: {}", line),
        }
    }

    if urls.is_empty() {
        return Err(TubescribeError::SourceEmpty(path.display().to_string()).into());
    }

    Ok(urls)
}

/// Enumerate audio artifacts from a directory scan, sorted for deterministic
/// processing order. A missing or empty directory aborts the run.
pub fn audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(TubescribeError::SourceNotFound(dir.display().to_string()).into());
    }

    let mut files = Vec::new();
    for entry in fs_err::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(TubescribeError::SourceEmpty(dir.display().to_string()).into());
    }

    Ok(files)
}
