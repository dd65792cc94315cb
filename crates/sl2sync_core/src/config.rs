//! Configuration for sync runs and the persisted key-value store.
//!
//! [`SyncConfig`] is built once at process start and threaded through the
//! engine — no module-level globals. The small amount of state that must
//! survive between runs (the configured remote and the per-host baseline
//! flags) lives behind the [`ConfigStore`] trait, with a JSON file
//! implementation for production and an in-memory one for tests.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Application data directory (`sl2sync` under the platform's data dir).
pub fn app_home() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sl2sync")
}

/// The host-identifying tag used for the keep-both variant suffix and the
/// once-per-host baseline gate.
pub fn machine_tag() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown-host".to_string())
}

fn default_rclone_bin() -> PathBuf {
    let name = if cfg!(windows) { "rclone.exe" } else { "rclone" };
    app_home().join("rclone").join(name)
}

/// Configuration for sync operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote save directory, e.g. `gdrive:ds2cloudsync`.
    pub remote: String,
    /// Path to the rclone binary.
    pub rclone_bin: PathBuf,
    /// Host-identifying tag for this machine.
    pub machine_tag: String,
    /// Override for the detected save root, mainly for tests and
    /// nonstandard installs.
    pub save_root: Option<PathBuf>,
}

impl SyncConfig {
    /// Creates a configuration for the given remote with platform defaults.
    pub fn new(remote: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            rclone_bin: default_rclone_bin(),
            machine_tag: machine_tag(),
            save_root: None,
        }
    }

    /// Sets the rclone binary path.
    pub fn with_rclone_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.rclone_bin = bin.into();
        self
    }

    /// Sets the host-identifying tag.
    pub fn with_machine_tag(mut self, tag: impl Into<String>) -> Self {
        self.machine_tag = tag.into();
        self
    }

    /// Overrides the detected save root.
    pub fn with_save_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.save_root = Some(root.into());
        self
    }
}

/// Persisted key-value state shared between runs.
pub trait ConfigStore: Send {
    /// The configured remote location, if any.
    fn remote(&self) -> Option<String>;

    /// Sets the remote location.
    fn set_remote(&mut self, remote: &str) -> SyncResult<()>;

    /// Whether this host has completed its one-time baseline sync.
    fn host_resynced(&self, host: &str) -> bool;

    /// Marks this host's baseline sync as done.
    fn mark_host_resynced(&mut self, host: &str) -> SyncResult<()>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    resynced_hosts: BTreeMap<String, bool>,
}

/// JSON-file-backed config store.
#[derive(Debug)]
pub struct JsonConfigStore {
    path: PathBuf,
    data: StoredConfig,
}

impl JsonConfigStore {
    /// The default config file location.
    pub fn default_path() -> PathBuf {
        app_home().join("config.json")
    }

    /// Opens the store at `path`, treating a missing or unreadable file as
    /// empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "config file unreadable, starting empty");
                StoredConfig::default()
            }),
            Err(_) => StoredConfig::default(),
        };
        Self { path, data }
    }

    /// The file this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.data)
            .map_err(|e| SyncError::config(&self.path, e.to_string()))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl ConfigStore for JsonConfigStore {
    fn remote(&self) -> Option<String> {
        self.data.remote.clone()
    }

    fn set_remote(&mut self, remote: &str) -> SyncResult<()> {
        self.data.remote = Some(remote.to_string());
        self.persist()
    }

    fn host_resynced(&self, host: &str) -> bool {
        self.data.resynced_hosts.get(host).copied().unwrap_or(false)
    }

    fn mark_host_resynced(&mut self, host: &str) -> SyncResult<()> {
        self.data.resynced_hosts.insert(host.to_string(), true);
        self.persist()
    }
}

/// In-memory config store for tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    data: StoredConfig,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn remote(&self) -> Option<String> {
        self.data.remote.clone()
    }

    fn set_remote(&mut self, remote: &str) -> SyncResult<()> {
        self.data.remote = Some(remote.to_string());
        Ok(())
    }

    fn host_resynced(&self, host: &str) -> bool {
        self.data.resynced_hosts.get(host).copied().unwrap_or(false)
    }

    fn mark_host_resynced(&mut self, host: &str) -> SyncResult<()> {
        self.data.resynced_hosts.insert(host.to_string(), true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new("gdrive:ds2cloudsync")
            .with_rclone_bin("/usr/bin/rclone")
            .with_machine_tag("steamdeck")
            .with_save_root("/tmp/saves");

        assert_eq!(config.remote, "gdrive:ds2cloudsync");
        assert_eq!(config.rclone_bin, PathBuf::from("/usr/bin/rclone"));
        assert_eq!(config.machine_tag, "steamdeck");
        assert_eq!(config.save_root, Some(PathBuf::from("/tmp/saves")));
    }

    #[test]
    fn json_store_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");

        let mut store = JsonConfigStore::open(&path);
        assert_eq!(store.remote(), None);
        store.set_remote("dropbox:saves").unwrap();
        store.mark_host_resynced("steamdeck").unwrap();

        let reopened = JsonConfigStore::open(&path);
        assert_eq!(reopened.remote(), Some("dropbox:saves".to_string()));
        assert!(reopened.host_resynced("steamdeck"));
        assert!(!reopened.host_resynced("desktop"));
    }

    #[test]
    fn corrupt_config_file_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonConfigStore::open(&path);
        assert_eq!(store.remote(), None);
    }

    #[test]
    fn memory_store_gates_per_host() {
        let mut store = MemoryConfigStore::new();
        assert!(!store.host_resynced("a"));
        store.mark_host_resynced("a").unwrap();
        assert!(store.host_resynced("a"));
        assert!(!store.host_resynced("b"));
    }
}
