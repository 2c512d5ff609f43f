use crate::domain::snapshot::Snapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// JSON mirror of the last published snapshot.
///
/// Writes go to a temp file first and are renamed into place, so a reader
/// never sees a half-written document.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    file_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn load(&self) -> Result<Option<Snapshot>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&self.file_path).context("Failed to read snapshot file")?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).context("Failed to parse snapshot JSON")?;

        info!(
            "Loaded snapshot from {:?} (captured {})",
            self.file_path,
            snapshot.captured_at()
        );
        Ok(Some(snapshot.restore_ids()))
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).context("Failed to create snapshot directory")?;
        }

        let content =
            serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;

        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp snapshot file")?;
        fs::rename(&temp_path, &self.file_path).context("Failed to rename snapshot file")?;

        info!("Saved snapshot to {:?}", self.file_path);
        Ok(())
    }
}
