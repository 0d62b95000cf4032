use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::Result;

const HEADER: &str = "title,video_id,channel_id";

/// One row of completed download work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Human-readable video title, informational only
    pub title: String,

    /// Platform-assigned video id, the sole dedup key
    pub video_id: String,

    /// Id of the channel that published the video
    pub channel_id: String,
}

/// Append-only CSV record of archived videos.
///
/// Rows are only ever appended, never rewritten, so `exists` scans every
/// recorded row. Callers must check `exists` before `append`; the store does
/// not enforce uniqueness itself.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the store with its header row. No-op if it already exists.
    pub fn initialize(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        fs_err::write(&self.path, format!("{}\n", HEADER))
            .with_context(|| format!("Failed to create ledger at {}", self.path.display()))?;

        Ok(())
    }

    /// True iff an entry with this video id has been recorded
    pub fn exists(&self, video_id: &str) -> Result<bool> {
        Ok(self.entries()?.iter().any(|entry| entry.video_id == video_id))
    }

    /// Append one entry and sync it to disk before returning, so a crash
    /// between items never loses a completed row.
    pub fn append(&self, entry: &LedgerEntry) -> Result<()> {
        let mut file = fs_err::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Ledger is not writable: {}", self.path.display()))?;

        writeln!(
            file,
            "{},{},{}",
            escape_field(&entry.title),
            escape_field(&entry.video_id),
            escape_field(&entry.channel_id)
        )?;
        file.sync_all()?;

        Ok(())
    }

    /// All recorded entries, oldest first
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let content = fs_err::read_to_string(&self.path)
            .with_context(|| format!("Failed to read ledger at {}", self.path.display()))?;

        let mut entries = Vec::new();
        for line in content.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }

            let fields = parse_row(line);
            if fields.len() != 3 {
                anyhow::bail!("Malformed ledger row: {}", line);
            }

            entries.push(LedgerEntry {
                title: fields[0].clone(),
                video_id: fields[1].clone(),
                channel_id: fields[2].clone(),
            });
        }

        Ok(entries)
    }

    /// Number of recorded entries
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }
}

/// Quote a field if it contains the delimiter or quotes; newlines are
/// flattened to spaces since the store is line-oriented.
fn escape_field(raw: &str) -> String {
    let flat: String = raw
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if flat.contains(',') || flat.contains('"') {
        format!("\"{}\"", flat.replace('"', "\"\""))
    } else {
        flat
    }
}

fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);

    fields
}
