//! Equality detection between the local save and its remote counterpart.
//!
//! Equality is decided by SHA-1 when the remote backend reports one, and by
//! byte size otherwise — a weaker but deliberate fallback for backends
//! without hash support. Any failure during comparison counts as "not
//! equal": ambiguity routes to the conflict path, never to a silent no-op.

use crate::error::SyncResult;
use crate::remote::RemoteEntry;
use chrono::{DateTime, Local};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Chunk size for streaming digests.
const DIGEST_CHUNK: usize = 64 * 1024;

/// Outcome of comparing the two sides of a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Neither side has a save file.
    BothAbsent,
    /// Local and remote saves are provably identical.
    Equal,
    /// The saves differ, only one side has one, or equality could not be
    /// established.
    Diverged,
}

/// Computes the SHA-1 digest of a file as lowercase hex, streaming in 64 KiB
/// chunks so large saves never load fully into memory.
pub fn file_sha1(path: &Path) -> SyncResult<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; DIGEST_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(to_hex(&hasher.finalize()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decides whether the local file and the remote entry hold the same content.
///
/// Digest comparison when the remote reports SHA-1, size comparison
/// otherwise. Missing files or unreadable metadata yield `false`.
pub fn are_equal(local: &Path, remote: &RemoteEntry) -> bool {
    if let Some(remote_sha1) = remote.sha1() {
        return match file_sha1(local) {
            Ok(local_sha1) => local_sha1.eq_ignore_ascii_case(remote_sha1),
            Err(err) => {
                debug!(path = %local.display(), %err, "digest failed, treating as diverged");
                false
            }
        };
    }

    match std::fs::metadata(local) {
        Ok(meta) => meta.len() as i64 == remote.size,
        Err(err) => {
            debug!(path = %local.display(), %err, "stat failed, treating as diverged");
            false
        }
    }
}

/// Classifies the two sides of a sync.
///
/// A `local` path that does not exist counts as absent, matching the
/// locator's placeholder-path contract.
pub fn classify(local: Option<&Path>, remote: Option<&RemoteEntry>) -> Comparison {
    match (local.filter(|p| p.exists()), remote) {
        (None, None) => Comparison::BothAbsent,
        (Some(path), Some(entry)) if are_equal(path, entry) => Comparison::Equal,
        _ => Comparison::Diverged,
    }
}

/// Builds the human-readable comparison summary shown to the user before a
/// conflict decision.
pub fn preview(local: Option<&Path>, remote: Option<&RemoteEntry>) -> String {
    let mut lines = vec!["Save preview:".to_string()];

    match local.filter(|p| p.exists()) {
        Some(path) => lines.push(local_line(path)),
        None => lines.push("Local : (none)".to_string()),
    }

    match remote {
        Some(entry) => lines.push(remote_line(entry)),
        None => lines.push("Cloud : (none)".to_string()),
    }

    lines.join("\n")
}

fn local_line(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let (size_kib, mtime) = match std::fs::metadata(path) {
        Ok(meta) => {
            let mtime = meta
                .modified()
                .map(|t| {
                    DateTime::<Local>::from(t)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                })
                .unwrap_or_else(|_| "(unknown)".to_string());
            (meta.len() as f64 / 1024.0, mtime)
        }
        Err(_) => (0.0, "(unknown)".to_string()),
    };
    let sha1 = file_sha1(path).unwrap_or_else(|_| "(unreadable)".to_string());
    format!("Local : {name} | {size_kib:.1} KiB | mtime {mtime} | sha1 {sha1}")
}

fn remote_line(entry: &RemoteEntry) -> String {
    let size_kib = entry.size.max(0) as f64 / 1024.0;
    let hash = entry.sha1().unwrap_or("(no-hash)");
    let mtime = entry.mod_time.as_deref().unwrap_or("(unknown)");
    format!(
        "Cloud : {} | {size_kib:.1} KiB | mtime {mtime} | hash {hash}",
        entry.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteEntry;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn save_with(contents: &[u8]) -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("DS2SOFS0000.sl2");
        let mut f = File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        (tmp, path)
    }

    #[test]
    fn sha1_known_vector() {
        let (_tmp, path) = save_with(b"abc");
        assert_eq!(
            file_sha1(&path).unwrap(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn sha1_empty_file() {
        let (_tmp, path) = save_with(b"");
        assert_eq!(
            file_sha1(&path).unwrap(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn digest_match_wins_over_wrong_size() {
        let (_tmp, path) = save_with(b"abc");
        // Remote reports a bogus size but the right digest; digest decides.
        let entry = RemoteEntry::file("DS2SOFS0000.sl2", 999)
            .with_sha1("a9993e364706816aba3e25717850c26c9cd0d89d");
        assert!(are_equal(&path, &entry));
    }

    #[test]
    fn digest_mismatch_diverges_despite_equal_size() {
        let (_tmp, path) = save_with(b"abc");
        let entry = RemoteEntry::file("DS2SOFS0000.sl2", 3)
            .with_sha1("0000000000000000000000000000000000000000");
        assert!(!are_equal(&path, &entry));
    }

    #[test]
    fn size_fallback_when_remote_has_no_digest() {
        let (_tmp, path) = save_with(b"12345");
        assert!(are_equal(&path, &RemoteEntry::file("x.sl2", 5)));
        assert!(!are_equal(&path, &RemoteEntry::file("x.sl2", 6)));
    }

    #[test]
    fn missing_local_file_diverges() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("DS2SOFS0000.sl2");
        let entry = RemoteEntry::file("DS2SOFS0000.sl2", 0);
        assert!(!are_equal(&missing, &entry));
        let hashed = entry.with_sha1("da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert!(!are_equal(&missing, &hashed));
    }

    #[test]
    fn uppercase_remote_digest_still_matches() {
        let (_tmp, path) = save_with(b"abc");
        let entry = RemoteEntry::file("x.sl2", 3)
            .with_sha1("A9993E364706816ABA3E25717850C26C9CD0D89D");
        assert!(are_equal(&path, &entry));
    }

    #[test]
    fn classify_covers_all_shapes() {
        let (_tmp, path) = save_with(b"abc");
        let equal_entry = RemoteEntry::file("x.sl2", 3)
            .with_sha1("a9993e364706816aba3e25717850c26c9cd0d89d");
        let other_entry = RemoteEntry::file("x.sl2", 99);

        assert_eq!(classify(None, None), Comparison::BothAbsent);
        assert_eq!(classify(Some(&path), None), Comparison::Diverged);
        assert_eq!(classify(None, Some(&other_entry)), Comparison::Diverged);
        assert_eq!(classify(Some(&path), Some(&equal_entry)), Comparison::Equal);
        assert_eq!(classify(Some(&path), Some(&other_entry)), Comparison::Diverged);
    }

    #[test]
    fn classify_treats_placeholder_path_as_absent() {
        let tmp = TempDir::new().unwrap();
        let placeholder = tmp.path().join("DS2SOFS0000.sl2");
        assert_eq!(classify(Some(&placeholder), None), Comparison::BothAbsent);
    }

    #[test]
    fn preview_shows_both_sides() {
        let (_tmp, path) = save_with(b"hello");
        let entry = RemoteEntry::file("DS2SOFS0000.sl2", 5)
            .with_sha1("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
        let text = preview(Some(&path), Some(&entry));
        assert!(text.starts_with("Save preview:"));
        assert!(text.contains("Local : DS2SOFS0000.sl2"));
        assert!(text.contains("Cloud : DS2SOFS0000.sl2"));
        assert!(text.contains("0.0 KiB"));
    }

    #[test]
    fn preview_marks_absent_sides() {
        let text = preview(None, None);
        assert!(text.contains("Local : (none)"));
        assert!(text.contains("Cloud : (none)"));
    }

    #[test]
    fn preview_placeholder_for_missing_remote_hash() {
        let entry = RemoteEntry::file("DARKSII0000.sl2", 2048);
        let text = preview(None, Some(&entry));
        assert!(text.contains("(no-hash)"));
        assert!(text.contains("2.0 KiB"));
    }

    proptest! {
        // With no remote digest, equality depends solely on byte size.
        #[test]
        fn size_fallback_policy(contents in proptest::collection::vec(any::<u8>(), 0..512),
                                remote_size in 0i64..1024) {
            let (_tmp, path) = save_with(&contents);
            let entry = RemoteEntry::file("x.sl2", remote_size);
            let expected = contents.len() as i64 == remote_size;
            prop_assert_eq!(are_equal(&path, &entry), expected);
        }

        // With a remote digest present, equality ignores the size field.
        #[test]
        fn digest_policy_ignores_size(contents in proptest::collection::vec(any::<u8>(), 0..512),
                                      remote_size in 0i64..1024) {
            let (_tmp, path) = save_with(&contents);
            let digest = file_sha1(&path).unwrap();
            let entry = RemoteEntry::file("x.sl2", remote_size).with_sha1(digest);
            prop_assert!(are_equal(&path, &entry));
        }
    }
}
