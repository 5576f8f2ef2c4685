use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::game_save::GameSave;

/// Persistence for the single save slot. One record, overwritten
/// wholesale; a record that cannot be read back is treated as absent,
/// never as an error.
pub trait SessionStore: Send {
    fn save(&self, save: &GameSave) -> Result<()>;
    fn load(&self) -> Option<GameSave>;
    fn clear(&self);
    fn exists(&self) -> bool;
}

/// JSON file slot under the platform data directory.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The regular slot: `<data_dir>/mindmaze/save.json`.
    pub fn at_default_location() -> Self {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("mindmaze");
        fs::create_dir_all(&path).ok();
        path.push("save.json");
        Self { path }
    }
}

impl SessionStore for FileStore {
    fn save(&self, save: &GameSave) -> Result<()> {
        let json = serde_json::to_string_pretty(save)?;

        // Staged write plus rename: the slot never holds a partial record.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;

        debug!(path = %self.path.display(), "save slot written");
        Ok(())
    }

    fn load(&self) -> Option<GameSave> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
    }

    fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}
