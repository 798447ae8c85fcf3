use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434/api/generate";
pub const DEFAULT_MODEL: &str = "gemma3:4b";

/// Settings for one translation request. Fetched once per trigger and held
/// unchanged until that request settles. Absent keys fall back to the
/// defaults below, so a partially written store still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub model: String,
    pub stream: bool,
    pub replace_selection_when_possible: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            stream: false,
            replace_selection_when_possible: false,
        }
    }
}

/// Read/write access to the persisted configuration. The engine only reads;
/// the write side exists for an options surface living outside this crate.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

/// JSON file store, kept next to the executable.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new() -> Self {
        Self { path: Self::default_path() }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
        let dir = exe.parent().unwrap_or(Path::new("."));
        dir.join("config.json")
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Config {
        match fs::read_to_string(&self.path) {
            Ok(s) => serde_json::from_str::<Config>(&s).unwrap_or_default(),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        let s = serde_json::to_string_pretty(cfg)?;
        fs::write(&self.path, s)?;
        Ok(())
    }
}

/// In-memory store for the demo binary and tests.
pub struct MemoryStore {
    cfg: Mutex<Config>,
}

impl MemoryStore {
    pub fn new(cfg: Config) -> Self {
        Self { cfg: Mutex::new(cfg) }
    }
}

impl ConfigStore for MemoryStore {
    fn load(&self) -> Config {
        self.cfg.lock().unwrap().clone()
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        *self.cfg.lock().unwrap() = cfg.clone();
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
