//! The `sync` command: a full engine run with a terminal conflict prompt.

use sl2sync_core::{
    ConfigStore, ConflictResolver, JsonConfigStore, RcloneTransport, Resolution, SyncConfig,
    SyncEngine, SyncError, SyncObserver,
};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Prints terse status lines; verbose mode also echoes subprocess output.
struct ConsoleObserver {
    verbose: bool,
}

impl SyncObserver for ConsoleObserver {
    fn status(&self, message: &str) {
        println!("{message}");
    }

    fn output(&self, line: &str) {
        if self.verbose {
            println!("  {line}");
        }
    }
}

/// Blocks on stdin for one of the four resolution tokens.
struct PromptResolver;

impl ConflictResolver for PromptResolver {
    fn resolve(&self, preview: &str) -> Resolution {
        println!("\n{preview}\n");
        println!("Local and cloud saves differ. Both sides have been backed up.");
        let stdin = io::stdin();
        loop {
            print!("Resolve [keep-local/use-cloud/keep-both/cancel]: ");
            let _ = io::stdout().flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                // EOF or read failure counts as cancel: never guess on a
                // destructive choice.
                Ok(0) | Err(_) => return Resolution::Cancel,
                Ok(_) => match Resolution::parse(&line) {
                    Some(choice) => return choice,
                    None => println!("Unrecognized choice."),
                },
            }
        }
    }
}

pub fn run(
    config_path: &Path,
    rclone: Option<&Path>,
    keep_local: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = JsonConfigStore::open(config_path);
    let remote = store.remote().ok_or(SyncError::RemoteNotConfigured)?;

    let mut config = SyncConfig::new(remote);
    if let Some(bin) = rclone {
        config = config.with_rclone_bin(bin);
    }
    let transport = RcloneTransport::new(&config.rclone_bin);

    let resolver: Box<dyn ConflictResolver> = if keep_local {
        Box::new(|_: &str| Resolution::KeepLocal)
    } else {
        Box::new(PromptResolver)
    };

    let engine = SyncEngine::new(config, transport)
        .with_observer(Box::new(ConsoleObserver { verbose }))
        .with_resolver(resolver);

    let local_dir = engine.locate_local_dir()?;
    if engine.ensure_host_baseline(&mut store, &local_dir)? {
        println!("One-time baseline sync for this host completed.");
    }

    let outcome = engine.sync(&local_dir)?;
    println!("{}", outcome.message());
    Ok(())
}
