//! Stores reply audio under the configured output directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bankvoice_core::audio;
use tracing::info;

/// Writes reply audio to disk, numbering files in arrival order.
pub struct ReplyStore {
    dir: PathBuf,
    saved: usize,
}

impl ReplyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(Self { dir, saved: 0 })
    }

    /// Saves one audio payload, keeping the `.wav` extension only when the
    /// bytes actually carry a RIFF/WAVE container.
    pub fn save(&mut self, bytes: &[u8]) -> Result<PathBuf> {
        self.saved += 1;
        let extension = if audio::is_riff_wav(bytes) { "wav" } else { "bin" };
        let path = self.dir.join(format!("reply-{:03}.{extension}", self.saved));
        fs::write(&path, bytes)
            .with_context(|| format!("failed to write reply audio to {}", path.display()))?;
        info!(path = %path.display(), len = bytes.len(), "stored reply audio");
        Ok(path)
    }
}
