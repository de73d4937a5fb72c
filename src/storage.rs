//! Durable persistence for the task list and custom category keys.
//!
//! The gateway is a stateless read/write facade over two independent JSON
//! slots inside the data directory:
//!
//! - `tasks_v2_multi_cat.json` — the full task array, rewritten on every
//!   save (last writer wins).
//! - `custom_categories.json` — the user-defined category keys as a plain
//!   string array.
//!
//! Loads fail open: a missing or unparsable slot yields an empty vector and
//! a warn-level log line, never an error. Legacy task records are normalised
//! during deserialization (see `task::TaskRecord`). No business rules live
//! here; invariant maintenance belongs to the store.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::task::Task;

/// Slot file for the task collection. The `v2_multi_cat` suffix is the
/// historical key under which multi-category records were first written;
/// keeping it lets existing data files load unchanged.
pub const TASKS_SLOT: &str = "tasks_v2_multi_cat.json";

/// Slot file for user-defined category keys.
pub const CUSTOM_CATEGORIES_SLOT: &str = "custom_categories.json";

/// Stateless facade over the two persisted slots.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: PathBuf) -> Self {
        Storage { dir }
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join(TASKS_SLOT)
    }

    pub fn custom_categories_path(&self) -> PathBuf {
        self.dir.join(CUSTOM_CATEGORIES_SLOT)
    }

    /// Load the task collection. Absent or corrupt data yields an empty
    /// list; legacy single-category records come back normalised.
    pub fn load_tasks(&self) -> Vec<Task> {
        self.load_slot(&self.tasks_path())
    }

    /// Serialize and overwrite the whole task slot.
    pub fn save_tasks(&self, tasks: &[Task]) -> anyhow::Result<()> {
        self.save_slot(&self.tasks_path(), &tasks)
    }

    /// Load the user-defined category keys, empty on absence or corruption.
    pub fn load_custom_categories(&self) -> Vec<String> {
        self.load_slot(&self.custom_categories_path())
    }

    /// Serialize and overwrite the custom-category slot.
    pub fn save_custom_categories(&self, keys: &[String]) -> anyhow::Result<()> {
        self.save_slot(&self.custom_categories_path(), &keys)
    }

    fn load_slot<T: DeserializeOwned + Default>(&self, path: &Path) -> T {
        if !path.exists() {
            debug!(path = %path.display(), "slot absent, starting empty");
            return T::default();
        }
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "slot unreadable, starting empty");
                return T::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "slot unparsable, starting empty");
                T::default()
            }
        }
    }

    /// Atomic-ish overwrite via temp file + rename.
    fn save_slot<T: Serialize>(&self, path: &Path, value: &T) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating data directory {}", self.dir.display()))?;
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(value)?;
        let mut f = File::create(&tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(&tmp, path)
            .with_context(|| format!("replacing {}", path.display()))?;
        debug!(path = %path.display(), bytes = data.len(), "slot written");
        Ok(())
    }
}
