//! Backup-before-mutation policy.
//!
//! Before any divergence-resolving mutation, both sides are snapshotted into
//! timestamped locations: the local profile into a sibling `Backups/local-*`
//! directory, the remote directory into `Backups/remote-*` under the same
//! remote. Backups accumulate and are never pruned here. The timestamp token
//! has whole-second resolution; two backups within the same second overwrite
//! that slot, an accepted limitation.

use crate::error::{SyncError, SyncResult};
use crate::events::SyncObserver;
use crate::remote::CloudTransport;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the backup area, on both sides.
pub const BACKUPS_DIR: &str = "Backups";

/// Sortable timestamp token for backup names.
pub fn timestamp_token() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Recursively copies the local save-profile directory into a timestamped
/// sibling backup and returns the backup path.
pub fn backup_local(local_dir: &Path) -> SyncResult<PathBuf> {
    let parent = local_dir.parent().ok_or_else(|| {
        SyncError::SaveRootNotFound(format!("{} has no parent", local_dir.display()))
    })?;
    let dest = parent
        .join(BACKUPS_DIR)
        .join(format!("local-{}", timestamp_token()));
    copy_dir_recursive(local_dir, &dest)?;
    debug!(backup = %dest.display(), "local backup created");
    Ok(dest)
}

/// Issues a remote-side copy of the save directory into a timestamped subpath
/// under the `Backups` prefix.
///
/// Best-effort: the destructive step has not happened yet, so a failed remote
/// backup downgrades to a warning and the intended backup path is still
/// returned for reporting.
pub fn backup_remote(
    transport: &dyn CloudTransport,
    remote_dir: &str,
    observer: &dyn SyncObserver,
) -> String {
    let dest = format!(
        "{}/{}/remote-{}",
        remote_dir.trim_end_matches('/'),
        BACKUPS_DIR,
        timestamp_token()
    );
    if let Err(err) = transport.copy_remote_to_remote(remote_dir, &dest, observer) {
        warn!(%err, remote = remote_dir, "remote backup failed, continuing");
    }
    dest
}

/// Creates a machine-tagged sibling copy of the local save file so the
/// original survives the keep-both resolution as a distinct artifact.
///
/// Returns the variant path, or `None` when no local save exists.
pub fn tag_local_variant(save: &Path, machine_tag: &str) -> SyncResult<Option<PathBuf>> {
    if !save.exists() {
        return Ok(None);
    }
    let stem = save
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = save
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let variant = save.with_file_name(format!("{stem}_{machine_tag}{ext}"));
    fs::copy(save, &variant)?;
    Ok(Some(variant))
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> SyncResult<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullObserver;
    use crate::remote::MockTransport;
    use tempfile::TempDir;

    #[test]
    fn local_backup_copies_tree() {
        let tmp = TempDir::new().unwrap();
        let profile = tmp.path().join("0110000107afa7e2");
        fs::create_dir_all(profile.join("extra")).unwrap();
        fs::write(profile.join("DS2SOFS0000.sl2"), b"save").unwrap();
        fs::write(profile.join("extra/notes.txt"), b"notes").unwrap();

        let backup = backup_local(&profile).unwrap();

        assert!(backup.starts_with(tmp.path().join(BACKUPS_DIR)));
        assert_eq!(fs::read(backup.join("DS2SOFS0000.sl2")).unwrap(), b"save");
        assert_eq!(fs::read(backup.join("extra/notes.txt")).unwrap(), b"notes");
        // Original untouched.
        assert!(profile.join("DS2SOFS0000.sl2").exists());
    }

    #[test]
    fn local_backup_name_is_sortable() {
        let tmp = TempDir::new().unwrap();
        let profile = tmp.path().join("0110000107afa7e2");
        fs::create_dir_all(&profile).unwrap();
        let backup = backup_local(&profile).unwrap();
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("local-"));
        // local-YYYYMMDD-HHMMSS
        assert_eq!(name.len(), "local-".len() + 15);
    }

    #[test]
    fn remote_backup_path_under_backups_prefix() {
        let mock = MockTransport::new();
        let dest = backup_remote(&mock, "gdrive:ds2/", &NullObserver);
        assert!(dest.starts_with("gdrive:ds2/Backups/remote-"));
        assert!(mock.calls()[0].starts_with("remote-copy gdrive:ds2/ ->"));
    }

    #[test]
    fn remote_backup_failure_is_not_fatal() {
        let mock = MockTransport::new();
        mock.set_fail_remote_backup(true);
        let dest = backup_remote(&mock, "gdrive:ds2", &NullObserver);
        assert!(dest.contains("/Backups/remote-"));
    }

    #[test]
    fn tag_variant_preserves_original() {
        let tmp = TempDir::new().unwrap();
        let save = tmp.path().join("DS2SOFS0000.sl2");
        fs::write(&save, b"progress").unwrap();

        let variant = tag_local_variant(&save, "steamdeck").unwrap().unwrap();

        assert_eq!(variant, tmp.path().join("DS2SOFS0000_steamdeck.sl2"));
        assert_eq!(fs::read(&variant).unwrap(), b"progress");
        assert_eq!(fs::read(&save).unwrap(), b"progress");
    }

    #[test]
    fn tag_variant_of_missing_save_is_none() {
        let tmp = TempDir::new().unwrap();
        let save = tmp.path().join("DS2SOFS0000.sl2");
        assert!(tag_local_variant(&save, "host").unwrap().is_none());
    }
}
