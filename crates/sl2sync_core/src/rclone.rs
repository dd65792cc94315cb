//! Rclone-backed implementation of [`CloudTransport`].
//!
//! All remote work is delegated to the rclone binary: `lsjson --hash` for
//! metadata, `copy --update` for newer-only directional copies, and `bisync`
//! for the full bidirectional reconciliation pass. This module only decides
//! flags; rclone owns rename tracking, deletion propagation, and empty
//! directory handling.

use crate::command::{run_command, CommandOutput};
use crate::error::SyncResult;
use crate::events::SyncObserver;
use crate::remote::{CloudTransport, RemoteEntry};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Invokes a local rclone binary as a subprocess.
#[derive(Debug, Clone)]
pub struct RcloneTransport {
    bin: PathBuf,
}

impl RcloneTransport {
    /// Creates a transport using the rclone binary at `bin`.
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    fn run(
        &self,
        args: Vec<String>,
        check: bool,
        observer: &dyn SyncObserver,
    ) -> SyncResult<CommandOutput> {
        run_command(&self.bin, &args, check, observer)
    }

    /// Creates the remote directory if missing. `mkdir` on an existing
    /// directory fails on some backends, so the exit status is ignored.
    fn ensure_remote_dir(&self, remote: &str, observer: &dyn SyncObserver) {
        observer.output(&format!("Ensuring remote directory exists: {remote}"));
        if let Err(err) = self.run(
            vec!["mkdir".to_string(), remote.to_string()],
            false,
            observer,
        ) {
            warn!(%err, remote, "rclone mkdir could not run");
        }
    }
}

impl CloudTransport for RcloneTransport {
    fn list(&self, remote: &str) -> Vec<RemoteEntry> {
        let args = vec![
            "lsjson".to_string(),
            "--hash".to_string(),
            remote.to_string(),
        ];
        let output = match self.run(args, false, &crate::NullObserver) {
            Ok(output) if output.success() => output,
            Ok(output) => {
                warn!(remote, code = ?output.code, "rclone lsjson failed, treating remote as empty");
                return Vec::new();
            }
            Err(err) => {
                warn!(%err, remote, "rclone lsjson could not run, treating remote as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&output.stdout) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(%err, remote, "rclone lsjson produced unparseable output");
                Vec::new()
            }
        }
    }

    fn copy_to_remote(
        &self,
        local: &Path,
        remote: &str,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        debug!(local = %local.display(), remote, "push (update-only)");
        self.run(
            vec![
                "copy".to_string(),
                local.display().to_string(),
                remote.to_string(),
                "--update".to_string(),
            ],
            true,
            observer,
        )?;
        Ok(())
    }

    fn copy_to_local(
        &self,
        remote: &str,
        local: &Path,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        debug!(remote, local = %local.display(), "pull (update-only)");
        self.run(
            vec![
                "copy".to_string(),
                remote.to_string(),
                local.display().to_string(),
                "--update".to_string(),
            ],
            true,
            observer,
        )?;
        Ok(())
    }

    fn copy_remote_to_remote(
        &self,
        src: &str,
        dst: &str,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        self.run(
            vec!["copy".to_string(), src.to_string(), dst.to_string()],
            true,
            observer,
        )?;
        Ok(())
    }

    fn bisync(
        &self,
        local: &Path,
        remote: &str,
        resync: bool,
        observer: &dyn SyncObserver,
    ) -> SyncResult<()> {
        self.ensure_remote_dir(remote, observer);

        let mut args = vec![
            "bisync".to_string(),
            local.display().to_string(),
            remote.to_string(),
        ];
        if resync {
            // Force-baseline mode for the first sync of a pairing.
            args.push("--resync".to_string());
            args.push("--create-empty-src-dirs".to_string());
            args.push("--verbose".to_string());
        } else {
            args.extend(
                [
                    "--create-empty-src-dirs",
                    "--compare",
                    "size,checksum,modtime",
                    "--conflict-resolve",
                    "newer",
                    "--verbose",
                ]
                .map(String::from),
            );
        }
        self.run(args, true, observer)?;
        Ok(())
    }
}
