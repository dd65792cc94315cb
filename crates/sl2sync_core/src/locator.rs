//! Save-file discovery heuristics.
//!
//! Dark Souls II keeps saves under a per-platform root, one subdirectory per
//! Steam profile (an opaque numeric or hexadecimal identifier), with the save
//! blob itself under one of a small set of canonical basenames. This module
//! locates the root, selects the active profile, and picks the canonical
//! save file — read-only except for creating a placeholder profile when none
//! exists yet.

use crate::error::{SyncError, SyncResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Canonical save basenames, checked in order; first match wins.
/// Scholar of the First Sin first, then vanilla.
pub const SAVE_BASENAMES: [&str; 2] = ["DS2SOFS0000.sl2", "DARKSII0000.sl2"];

/// Extension of save files, used by the fallback lookup.
pub const SAVE_EXTENSION: &str = "sl2";

/// Profile created when no profile directory exists yet.
pub const PLACEHOLDER_PROFILE: &str = "0000000000000000";

/// Steam app ID for Scholar of the First Sin.
const APPID_SOTFS: &str = "335300";
/// Steam app ID for vanilla Dark Souls II.
const APPID_VANILLA: &str = "236430";

/// Directory name the game uses under the platform's appdata root.
const SAVE_DIR_NAME: &str = "DarkSoulsII";

/// Detection report for the status surface.
#[derive(Debug, Clone)]
pub struct InstallStatus {
    /// Whether the save root exists on this machine.
    pub installed: bool,
    /// Whether any profile contains a save file.
    pub has_saves: bool,
    /// The detected save root, when detection succeeded.
    pub save_root: Option<PathBuf>,
    /// Human-readable summary.
    pub message: String,
}

/// Detects the directory under which per-profile save folders live.
///
/// Never writes; existence checks only.
pub fn detect_save_root() -> SyncResult<PathBuf> {
    platform_save_root()
}

#[cfg(windows)]
fn platform_save_root() -> SyncResult<PathBuf> {
    let appdata = std::env::var_os("APPDATA")
        .ok_or_else(|| SyncError::SaveRootNotFound("APPDATA is not set".to_string()))?;
    Ok(PathBuf::from(appdata).join(SAVE_DIR_NAME))
}

#[cfg(target_os = "macos")]
fn platform_save_root() -> SyncResult<PathBuf> {
    let home = home_dir()?;
    let native = home
        .join("Library")
        .join("Application Support")
        .join(SAVE_DIR_NAME);
    if native.exists() {
        return Ok(native);
    }

    // Steam (Proton/CrossOver) installs keep saves inside a Wine prefix.
    let prefixes = [
        home.join(".steam/steam/steamapps/compatdata")
            .join(APPID_SOTFS)
            .join("pfx"),
        home.join(".steam/steam/steamapps/compatdata")
            .join(APPID_VANILLA)
            .join("pfx"),
        home.join("Library/Application Support/CrossOver/Bottles"),
    ];
    for prefix in &prefixes {
        if let Some(found) = wine_user_save_dir(prefix) {
            return Ok(found);
        }
    }

    Ok(native)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn platform_save_root() -> SyncResult<PathBuf> {
    let home = home_dir()?;
    let base = home.join(".local/share/Steam/steamapps/compatdata");

    for appid in [APPID_SOTFS, APPID_VANILLA] {
        let prefix = base.join(appid).join("pfx");
        if let Some(found) = wine_user_save_dir(&prefix) {
            return Ok(found);
        }
    }

    // Steam Deck ships a fixed "steamuser" prefix user.
    for appid in [APPID_SOTFS, APPID_VANILLA] {
        let fallback = base
            .join(appid)
            .join("pfx/drive_c/users/steamuser/AppData/Roaming")
            .join(SAVE_DIR_NAME);
        if fallback.exists() {
            return Ok(fallback);
        }
    }

    Ok(base
        .join(APPID_SOTFS)
        .join("pfx/drive_c/users/steamuser/AppData/Roaming")
        .join(SAVE_DIR_NAME))
}

#[cfg(not(windows))]
fn home_dir() -> SyncResult<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| SyncError::SaveRootNotFound("home directory unknown".to_string()))
}

/// Scans the `drive_c/users/*` directories of a Wine prefix for the save dir.
#[cfg(not(windows))]
fn wine_user_save_dir(prefix: &Path) -> Option<PathBuf> {
    let users = prefix.join("drive_c").join("users");
    for entry in fs::read_dir(users).ok()?.flatten() {
        let candidate = entry
            .path()
            .join("AppData")
            .join("Roaming")
            .join(SAVE_DIR_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Length-based heuristic for opaque profile identifiers, permissive to both
/// numeric and hexadecimal forms.
fn looks_like_profile_id(name: &str) -> bool {
    name.len() > 5
}

fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// The most recently modified `.sl2` file in `dir`, if any.
fn newest_save(dir: &Path) -> Option<(PathBuf, SystemTime)> {
    let mut newest: Option<(PathBuf, SystemTime)> = None;
    for entry in fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        let is_save = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(SAVE_EXTENSION));
        if !is_save {
            continue;
        }
        let modified = mtime(&path);
        if newest.as_ref().is_none_or(|(_, t)| modified > *t) {
            newest = Some((path, modified));
        }
    }
    newest
}

/// Selects the active save profile under `root`, creating a placeholder
/// profile when none exists.
///
/// Profiles that contain a save file win; ties break on the mtime of their
/// newest save. Only when no profile has a save does the directory's own
/// mtime decide — directory mtimes are unreliable across filesystem copies
/// and syncs, the save file's mtime is the trustworthy signal.
pub fn select_profile(root: &Path) -> SyncResult<PathBuf> {
    fs::create_dir_all(root)?;

    let mut profiles = Vec::new();
    for entry in fs::read_dir(root)?.flatten() {
        let path = entry.path();
        if path.is_dir() && looks_like_profile_id(&entry.file_name().to_string_lossy()) {
            profiles.push(path);
        }
    }

    if profiles.is_empty() {
        let placeholder = root.join(PLACEHOLDER_PROFILE);
        fs::create_dir_all(&placeholder)?;
        debug!(profile = %placeholder.display(), "created placeholder profile");
        return Ok(placeholder);
    }

    let mut with_saves: Vec<(PathBuf, SystemTime)> = Vec::new();
    let mut without_saves: Vec<(PathBuf, SystemTime)> = Vec::new();
    for profile in profiles {
        match newest_save(&profile) {
            Some((_, modified)) => with_saves.push((profile, modified)),
            None => {
                let modified = mtime(&profile);
                without_saves.push((profile, modified));
            }
        }
    }

    let pool = if with_saves.is_empty() {
        &mut without_saves
    } else {
        &mut with_saves
    };
    pool.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(pool[0].0.clone())
}

/// Locates the canonical save file inside a profile directory.
///
/// Canonical basenames are checked first, in order; only then does the newest
/// `.sl2` file win. A stale canonically-named file therefore beats a newer
/// non-canonical one — a deliberate simplicity trade-off. When nothing
/// exists, returns the first canonical basename as a placeholder path;
/// callers must check existence. Never fails.
pub fn find_save_file(profile: &Path) -> PathBuf {
    for basename in SAVE_BASENAMES {
        let candidate = profile.join(basename);
        if candidate.exists() {
            return candidate;
        }
    }

    if let Some((newest, _)) = newest_save(profile) {
        return newest;
    }

    profile.join(SAVE_BASENAMES[0])
}

/// Reports the game installation and save status at `root`.
pub fn installation_status_at(root: &Path) -> InstallStatus {
    if !root.exists() {
        return InstallStatus {
            installed: false,
            has_saves: false,
            save_root: Some(root.to_path_buf()),
            message: "Dark Souls II not detected on this system".to_string(),
        };
    }

    let profiles: Vec<PathBuf> = fs::read_dir(root)
        .map(|read| {
            read.flatten()
                .map(|e| e.path())
                .filter(|p| {
                    p.is_dir()
                        && p.file_name()
                            .is_some_and(|n| looks_like_profile_id(&n.to_string_lossy()))
                })
                .collect()
        })
        .unwrap_or_default();

    if profiles.is_empty() {
        return InstallStatus {
            installed: true,
            has_saves: false,
            save_root: Some(root.to_path_buf()),
            message: "Dark Souls II detected but no saves found yet".to_string(),
        };
    }

    let has_saves = profiles.iter().any(|p| newest_save(p).is_some());
    let message = if has_saves {
        format!(
            "Dark Souls II saves found ({} profile{})",
            profiles.len(),
            if profiles.len() == 1 { "" } else { "s" }
        )
    } else {
        "Dark Souls II detected but no save files found yet".to_string()
    };

    InstallStatus {
        installed: true,
        has_saves,
        save_root: Some(root.to_path_buf()),
        message,
    }
}

/// Detects the save root and reports installation status.
pub fn installation_status() -> InstallStatus {
    match detect_save_root() {
        Ok(root) => installation_status_at(&root),
        Err(err) => InstallStatus {
            installed: false,
            has_saves: false,
            save_root: None,
            message: format!("Error detecting Dark Souls II: {err}"),
        },
    }
}
