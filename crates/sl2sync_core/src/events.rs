//! Progress reporting for sync runs.
//!
//! A sync run reports on two distinct channels: terse status lines meant for
//! a status bar ("Creating backups…") and the raw line-by-line output of the
//! subprocesses it drives. UI layers consume the two very differently, so
//! they stay separate methods rather than one event stream.

/// Receives progress from a running sync.
///
/// Both methods have no-op defaults so an implementation can subscribe to
/// only the channel it cares about.
pub trait SyncObserver: Send + Sync {
    /// A terse, human-readable status update.
    fn status(&self, _message: &str) {}

    /// A single line of verbose subprocess output.
    fn output(&self, _line: &str) {}
}

/// An observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SyncObserver for NullObserver {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Collecting {
        status: Mutex<Vec<String>>,
        output: Mutex<Vec<String>>,
    }

    impl SyncObserver for Collecting {
        fn status(&self, message: &str) {
            self.status.lock().unwrap().push(message.to_string());
        }

        fn output(&self, line: &str) {
            self.output.lock().unwrap().push(line.to_string());
        }
    }

    #[test]
    fn channels_are_independent() {
        let obs = Collecting {
            status: Mutex::new(Vec::new()),
            output: Mutex::new(Vec::new()),
        };
        obs.status("Creating backups…");
        obs.output("rclone: transferred 1 file");

        assert_eq!(obs.status.lock().unwrap().len(), 1);
        assert_eq!(obs.output.lock().unwrap().len(), 1);
    }

    #[test]
    fn null_observer_accepts_everything() {
        let obs = NullObserver;
        obs.status("ignored");
        obs.output("ignored");
    }
}
