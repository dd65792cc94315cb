//! # sl2sync core
//!
//! Sync decision engine for keeping a Dark Souls II save file consistent
//! between the local filesystem and a cloud remote driven by rclone.
//!
//! This crate provides:
//! - Save discovery heuristics (root detection, profile selection, canonical
//!   save lookup)
//! - Equality detection (SHA-1 when the remote reports one, byte size as
//!   fallback)
//! - Backup-before-mutation policy on both sides
//! - The conflict-resolution state machine (push / pull / duplicate / merge)
//! - An rclone-backed cloud transport and a mock for tests
//!
//! ## Architecture
//!
//! One sync run flows one direction: locate → compare → (backup) → resolve →
//! directional copy → final bidirectional reconciliation. The byte-level
//! reconciliation of directory trees is delegated to `rclone bisync`; this
//! crate decides when to invoke it and with which flags.
//!
//! ## Key invariants
//!
//! - Both sides are backed up before any equality check is evaluated
//! - A destructive copy is never issued without those backups
//! - Every resolution branch ends in a reconciliation pass, except cancel
//! - Comparison ambiguity resolves to "diverged", never silently to "equal"

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backup;
mod command;
mod compare;
mod config;
mod engine;
mod error;
mod events;
mod locator;
mod rclone;
mod remote;
mod resolver;

pub use backup::{backup_local, backup_remote, tag_local_variant, timestamp_token, BACKUPS_DIR};
pub use command::{run_command, CommandOutput};
pub use compare::{are_equal, classify, file_sha1, preview, Comparison};
pub use config::{
    app_home, machine_tag, ConfigStore, JsonConfigStore, MemoryConfigStore, SyncConfig,
};
pub use engine::{SyncEngine, SyncOutcome, SyncState, SyncStats};
pub use error::{SyncError, SyncResult};
pub use events::{NullObserver, SyncObserver};
pub use locator::{
    detect_save_root, find_save_file, installation_status, installation_status_at,
    select_profile, InstallStatus, PLACEHOLDER_PROFILE, SAVE_BASENAMES, SAVE_EXTENSION,
};
pub use rclone::RcloneTransport;
pub use remote::{find_remote_save, CloudTransport, MockTransport, RemoteEntry};
pub use resolver::{ConflictResolver, Resolution};
