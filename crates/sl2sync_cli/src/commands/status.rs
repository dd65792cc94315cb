//! The `status` command: read-only detection report.

use sl2sync_core::{installation_status, ConfigStore, JsonConfigStore, SAVE_BASENAMES};
use std::path::Path;

pub fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonConfigStore::open(config_path);
    let status = installation_status();

    println!("{}", status.message);
    if let Some(root) = &status.save_root {
        println!("Save root    : {}", root.display());
    }
    println!(
        "Cloud remote : {}",
        store.remote().unwrap_or_else(|| "(not set)".to_string())
    );
    println!("Config file  : {}", config_path.display());
    println!("Save names   : {}", SAVE_BASENAMES.join(", "));
    Ok(())
}
