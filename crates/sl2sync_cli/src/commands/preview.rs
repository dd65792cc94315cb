//! The `preview` command: print the comparison summary without syncing.

use sl2sync_core::{
    detect_save_root, find_remote_save, find_save_file, preview, select_profile, CloudTransport,
    ConfigStore, JsonConfigStore, RcloneTransport, SyncConfig, SyncError,
};
use std::path::Path;

pub fn run(config_path: &Path, rclone: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonConfigStore::open(config_path);
    let remote = store.remote().ok_or(SyncError::RemoteNotConfigured)?;

    let mut config = SyncConfig::new(remote);
    if let Some(bin) = rclone {
        config = config.with_rclone_bin(bin);
    }

    let root = detect_save_root()?;
    let profile = select_profile(&root)?;
    let save = find_save_file(&profile);

    let transport = RcloneTransport::new(&config.rclone_bin);
    let entries = transport.list(&config.remote);
    let entry = find_remote_save(&entries);

    println!(
        "{}",
        preview(save.exists().then_some(save.as_path()), entry)
    );
    Ok(())
}
