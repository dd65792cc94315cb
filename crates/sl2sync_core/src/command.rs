//! Subprocess execution with captured and optionally streamed output.
//!
//! Every external invocation (rclone listing, directional copies, bisync)
//! goes through [`run_command`], which merges stderr into the captured
//! output, streams lines to a [`SyncObserver`] as they arrive, and turns a
//! non-zero exit into a [`SyncError::Command`] carrying the full output.

use crate::error::{SyncError, SyncResult};
use crate::events::SyncObserver;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Outcome of a finished subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns true if the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr, for error reporting.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Runs `program` with `args`, streaming stdout lines to `observer` in real
/// time and draining stderr on a helper thread.
///
/// With `check` set, a non-zero exit becomes [`SyncError::Command`] whose
/// message is the captured output (or the command line when the process
/// printed nothing). Spawn failures are always errors regardless of `check`.
pub fn run_command(
    program: &Path,
    args: &[String],
    check: bool,
    observer: &dyn SyncObserver,
) -> SyncResult<CommandOutput> {
    let command_line = format!("{} {}", program.display(), args.join(" "));
    debug!(command = %command_line, "running subprocess");
    observer.output(&format!("Running: {command_line}"));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Drain stderr concurrently so neither pipe can fill up and stall the child.
    let stderr_pipe = child.stderr.take();
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe {
            let _ = BufReader::new(pipe).read_to_string(&mut buf);
        }
        buf
    });

    let mut stdout = String::new();
    if let Some(pipe) = child.stdout.take() {
        for line in BufReader::new(pipe).lines() {
            let line = line?;
            observer.output(&line);
            stdout.push_str(&line);
            stdout.push('\n');
        }
    }

    let status = child.wait()?;
    let stderr = stderr_handle.join().unwrap_or_default();
    for line in stderr.lines() {
        observer.output(line);
    }

    let output = CommandOutput {
        code: status.code(),
        stdout,
        stderr,
    };

    if check && !output.success() {
        let combined = output.combined();
        let message = if combined.trim().is_empty() {
            format!("exit status {:?}", output.code)
        } else {
            combined
        };
        return Err(SyncError::command(command_line, message));
    }

    Ok(output)
}
