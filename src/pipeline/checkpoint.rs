use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::state::ProjectState;
use super::types::StageKind;

const CHECKPOINT_FILE: &str = "checkpoint.json";

/// State persisted between stages. `next_stage` is `None` once the run finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub next_stage: Option<StageKind>,
    pub state: ProjectState,
}

pub trait CheckpointStore: Send + Sync {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    fn load(&self) -> Result<Option<Checkpoint>>;
}

/// Single pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CHECKPOINT_FILE),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Unable to create checkpoint directory {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(checkpoint)
            .context("Failed to serialize checkpoint to JSON")?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)
            .with_context(|| format!("Failed to write checkpoint to {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to move checkpoint into {}", self.path.display()))?;
        Ok(())
    }

    fn load(&self) -> Result<Option<Checkpoint>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed reading checkpoint at {}", self.path.display()))?;
        let checkpoint = serde_json::from_str(&contents)
            .with_context(|| format!("Failed parsing checkpoint at {}", self.path.display()))?;
        Ok(Some(checkpoint))
    }
}
