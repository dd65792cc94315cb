//! The `remote` command: get or set the configured cloud remote.

use sl2sync_core::{ConfigStore, JsonConfigStore};
use std::path::Path;
use tracing::info;

pub fn get(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonConfigStore::open(config_path);
    match store.remote() {
        Some(remote) => println!("{remote}"),
        None => println!("(not set)"),
    }
    Ok(())
}

pub fn set(config_path: &Path, remote: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = JsonConfigStore::open(config_path);
    store.set_remote(remote)?;
    info!(remote, "remote configured");
    println!("Cloud remote set to {remote}");
    Ok(())
}
