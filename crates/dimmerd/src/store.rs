//! Persistence of the dim level across restarts.
//!
//! A single decimal integer in a single file, written by a single writer (the
//! engine). Durability is best effort: a failed save is logged by the caller
//! and never aborts the action already applied to the hardware.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;
use tracing::warn;

/// Persisted scalar store for the dim index.
pub trait LevelStore: Send {
    /// Read the stored level. `None` when absent or unreadable; read failure
    /// is non-fatal and the caller falls back to its default.
    fn load(&self) -> Option<u32>;

    fn save(&self, level: u32) -> io::Result<()>;
}

/// File-backed store.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LevelStore for FileStore {
    fn load(&self) -> Option<u32> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no stored dim level at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("failed to read stored dim level from {}: {}", self.path.display(), e);
                return None;
            }
        };

        match contents.trim().parse::<u32>() {
            Ok(level) => Some(level),
            Err(e) => {
                warn!(
                    "stored dim level in {} is not a valid integer: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn save(&self, level: u32) -> io::Result<()> {
        fs::write(&self.path, format!("{level}\n"))
    }
}

/// In-memory store for tests. Clones share the stored value.
#[cfg(test)]
#[derive(Clone)]
pub struct MemoryStore {
    level: std::sync::Arc<std::sync::Mutex<Option<u32>>>,
    fail_saves: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new(level: Option<u32>) -> Self {
        Self {
            level: std::sync::Arc::new(std::sync::Mutex::new(level)),
            fail_saves: false,
        }
    }

    /// A store whose saves always fail.
    pub fn unavailable(level: Option<u32>) -> Self {
        Self {
            fail_saves: true,
            ..Self::new(level)
        }
    }

    pub fn stored(&self) -> Option<u32> {
        *self.level.lock().unwrap()
    }
}

#[cfg(test)]
impl LevelStore for MemoryStore {
    fn load(&self) -> Option<u32> {
        *self.level.lock().unwrap()
    }

    fn save(&self, level: u32) -> io::Result<()> {
        if self.fail_saves {
            return Err(io::Error::other("store unavailable"));
        }
        *self.level.lock().unwrap() = Some(level);
        Ok(())
    }
}
