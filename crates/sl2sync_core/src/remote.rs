//! Remote metadata model and the cloud transport abstraction.
//!
//! The transport trait abstracts everything the engine asks of the remote
//! side, allowing an rclone-backed implementation in production and a
//! recording mock in tests.

use crate::error::SyncResult;
use crate::events::SyncObserver;
use crate::locator::SAVE_BASENAMES;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Metadata for one remote file or directory, as reported by
/// `rclone lsjson --hash`. A snapshot of a query result; stale immediately
/// after retrieval.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntry {
    /// Entry basename.
    #[serde(rename = "Name")]
    pub name: String,
    /// Size in bytes (`-1` when unknown).
    #[serde(rename = "Size", default)]
    pub size: i64,
    /// Whether the entry is a directory.
    #[serde(rename = "IsDir", default)]
    pub is_dir: bool,
    /// Modification time as reported by the backend.
    #[serde(rename = "ModTime", default)]
    pub mod_time: Option<String>,
    /// Content hashes keyed by algorithm name ("SHA-1", "MD5", ...).
    /// Absent when the backend does not support hashes.
    #[serde(rename = "Hashes", default)]
    pub hashes: Option<HashMap<String, String>>,
}

impl RemoteEntry {
    /// Creates a plain file entry. Mostly useful in tests.
    pub fn file(name: impl Into<String>, size: i64) -> Self {
        Self {
            name: name.into(),
            size,
            is_dir: false,
            mod_time: None,
            hashes: None,
        }
    }

    /// Sets the SHA-1 content hash.
    pub fn with_sha1(mut self, digest: impl Into<String>) -> Self {
        self.hashes
            .get_or_insert_with(HashMap::new)
            .insert("SHA-1".to_string(), digest.into());
        self
    }

    /// The SHA-1 content hash, when the backend reported one.
    pub fn sha1(&self) -> Option<&str> {
        self.hashes.as_ref()?.get("SHA-1").map(String::as_str)
    }
}

/// Finds the remote counterpart of the canonical save file.
///
/// Filters to files only and matches the canonical basename list in order,
/// first match wins — the same policy the local locator uses.
pub fn find_remote_save(entries: &[RemoteEntry]) -> Option<&RemoteEntry> {
    for basename in SAVE_BASENAMES {
        if let Some(entry) = entries
            .iter()
            .find(|e| !e.is_dir && e.name == basename)
        {
            return Some(entry);
        }
    }
    None
}

/// Operations the sync engine needs from the cloud side.
///
/// Implemented by [`crate::RcloneTransport`] in production and by
/// [`MockTransport`] in tests.
pub trait CloudTransport: Send + Sync {
    /// Lists remote metadata without transferring content.
    ///
    /// Soft-fails to an empty listing on any query failure: the engine treats
    /// "no remote entry" the same whether the save is truly absent or the
    /// query broke. Accepted limitation, see DESIGN.md.
    fn list(&self, remote: &str) -> Vec<RemoteEntry>;

    /// Copies local directory contents to the remote, newer-only semantics.
    fn copy_to_remote(
        &self,
        local: &Path,
        remote: &str,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()>;

    /// Copies remote directory contents to local, newer-only semantics.
    fn copy_to_local(
        &self,
        remote: &str,
        local: &Path,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()>;

    /// Server-side copy of one remote directory to another (backups).
    fn copy_remote_to_remote(
        &self,
        src: &str,
        dst: &str,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()>;

    /// Runs the bidirectional reconciliation pass. `resync` selects the
    /// force-baseline first-run mode instead of steady-state.
    fn bisync(
        &self,
        local: &Path,
        remote: &str,
        resync: bool,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()>;
}

impl<T: CloudTransport + ?Sized> CloudTransport for std::sync::Arc<T> {
    fn list(&self, remote: &str) -> Vec<RemoteEntry> {
        (**self).list(remote)
    }

    fn copy_to_remote(
        &self,
        local: &Path,
        remote: &str,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        (**self).copy_to_remote(local, remote, observer)
    }

    fn copy_to_local(
        &self,
        remote: &str,
        local: &Path,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        (**self).copy_to_local(remote, local, observer)
    }

    fn copy_remote_to_remote(
        &self,
        src: &str,
        dst: &str,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        (**self).copy_remote_to_remote(src, dst, observer)
    }

    fn bisync(
        &self,
        local: &Path,
        remote: &str,
        resync: bool,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        (**self).bisync(local, remote, resync, observer)
    }
}

/// A transport for tests that records every call in order.
#[derive(Debug, Default)]
pub struct MockTransport {
    entries: parking_lot::Mutex<Vec<RemoteEntry>>,
    calls: parking_lot::Mutex<Vec<String>>,
    fail_bisync: std::sync::atomic::AtomicBool,
    fail_copies: std::sync::atomic::AtomicBool,
    fail_remote_backup: std::sync::atomic::AtomicBool,
}

impl MockTransport {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entries the next `list` calls will return.
    pub fn set_entries(&self, entries: Vec<RemoteEntry>) {
        *self.entries.lock() = entries;
    }

    /// Makes every subsequent bisync call fail.
    pub fn set_fail_bisync(&self, fail: bool) {
        self.fail_bisync
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Makes every subsequent directional copy fail.
    pub fn set_fail_copies(&self, fail: bool) {
        self.fail_copies
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Makes every subsequent remote-to-remote copy fail.
    pub fn set_fail_remote_backup(&self, fail: bool) {
        self.fail_remote_backup
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// The calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn flag(&self, flag: &std::sync::atomic::AtomicBool) -> bool {
        flag.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl CloudTransport for MockTransport {
    fn list(&self, remote: &str) -> Vec<RemoteEntry> {
        self.record(format!("list {remote}"));
        self.entries.lock().clone()
    }

    fn copy_to_remote(
        &self,
        local: &Path,
        remote: &str,
        _observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        self.record(format!("push {} -> {remote}", local.display()));
        if self.flag(&self.fail_copies) {
            return Err(crate::SyncError::command("mock push", "copy failed"));
        }
        Ok(())
    }

    fn copy_to_local(
        &self,
        remote: &str,
        local: &Path,
        _observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        self.record(format!("pull {remote} -> {}", local.display()));
        if self.flag(&self.fail_copies) {
            return Err(crate::SyncError::command("mock pull", "copy failed"));
        }
        Ok(())
    }

    fn copy_remote_to_remote(
        &self,
        src: &str,
        dst: &str,
        _observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        self.record(format!("remote-copy {src} -> {dst}"));
        if self.flag(&self.fail_remote_backup) {
            return Err(crate::SyncError::command("mock remote copy", "copy failed"));
        }
        Ok(())
    }

    fn bisync(
        &self,
        local: &Path,
        remote: &str,
        resync: bool,
        _observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        let mode = if resync { "resync" } else { "steady" };
        self.record(format!("bisync[{mode}] {} <-> {remote}", local.display()));
        if self.flag(&self.fail_bisync) {
            return Err(crate::SyncError::command("mock bisync", "bisync failed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsjson_entry_deserializes() {
        let json = r#"{
            "Path": "DS2SOFS0000.sl2",
            "Name": "DS2SOFS0000.sl2",
            "Size": 10485760,
            "MimeType": "application/octet-stream",
            "ModTime": "2024-03-09T17:21:08.000Z",
            "IsDir": false,
            "Hashes": {"SHA-1": "da39a3ee5e6b4b0d3255bfef95601890afd80709"}
        }"#;
        let entry: RemoteEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.name, "DS2SOFS0000.sl2");
        assert_eq!(entry.size, 10_485_760);
        assert!(!entry.is_dir);
        assert_eq!(
            entry.sha1(),
            Some("da39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }

    #[test]
    fn entry_without_hashes_has_no_sha1() {
        let json = r#"{"Name": "x.sl2", "Size": 5, "IsDir": false}"#;
        let entry: RemoteEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.sha1(), None);
        assert_eq!(entry.mod_time, None);
    }

    #[test]
    fn find_remote_save_skips_directories() {
        let mut dir = RemoteEntry::file("DS2SOFS0000.sl2", -1);
        dir.is_dir = true;
        let entries = vec![dir, RemoteEntry::file("DARKSII0000.sl2", 42)];
        let found = find_remote_save(&entries).unwrap();
        assert_eq!(found.name, "DARKSII0000.sl2");
    }

    #[test]
    fn find_remote_save_prefers_canonical_order() {
        let entries = vec![
            RemoteEntry::file("DARKSII0000.sl2", 1),
            RemoteEntry::file("DS2SOFS0000.sl2", 2),
        ];
        let found = find_remote_save(&entries).unwrap();
        assert_eq!(found.name, "DS2SOFS0000.sl2");
    }

    #[test]
    fn find_remote_save_empty_listing() {
        assert!(find_remote_save(&[]).is_none());
        let entries = vec![RemoteEntry::file("readme.txt", 9)];
        assert!(find_remote_save(&entries).is_none());
    }

    #[test]
    fn mock_records_call_order() {
        let mock = MockTransport::new();
        let obs = crate::NullObserver;
        mock.list("gdrive:saves");
        mock.bisync(Path::new("/tmp/x"), "gdrive:saves", true, &obs)
            .unwrap();
        let calls = mock.calls();
        assert_eq!(calls[0], "list gdrive:saves");
        assert!(calls[1].starts_with("bisync[resync]"));
    }
}
