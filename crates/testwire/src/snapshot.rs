//! Text snapshot testing.
//!
//! Serialized wiring trees are plain strings, so snapshots are plain text
//! files: one `<name>.snap` per snapshot under the snapshot directory.
//! The first run records, later runs compare, and update mode rewrites.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use crate::result::{WiringError, WiringResult};

/// Environment variable switching on update mode (`1` or `true`)
pub const UPDATE_ENV: &str = "TESTWIRE_UPDATE_SNAPSHOTS";

/// Configuration for snapshot testing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Whether to rewrite snapshots on mismatch
    pub update_snapshots: bool,
    /// Directory to store snapshots
    pub snapshot_dir: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            update_snapshots: false,
            snapshot_dir: String::from("__snapshots__"),
        }
    }
}

impl SnapshotConfig {
    /// Defaults, with update mode read from `TESTWIRE_UPDATE_SNAPSHOTS`
    #[must_use]
    pub fn from_env() -> Self {
        let update = std::env::var(UPDATE_ENV)
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self::default().with_update(update)
    }

    /// Set update mode
    #[must_use]
    pub const fn with_update(mut self, update: bool) -> Self {
        self.update_snapshots = update;
        self
    }

    /// Set snapshot directory
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<String>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    fn path(&self, name: &str) -> PathBuf {
        let file: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        PathBuf::from(&self.snapshot_dir).join(format!("{file}.snap"))
    }
}

/// A named text snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Snapshot name/identifier
    pub name: String,
    /// Serialized content
    pub content: String,
}

impl Snapshot {
    /// Create a new snapshot
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Compare this snapshot to another
    #[must_use]
    pub fn diff(&self, other: &Self) -> SnapshotDiff {
        let expected: Vec<&str> = self.content.lines().collect();
        let actual: Vec<&str> = other.content.lines().collect();
        let mut lines = Vec::new();
        for i in 0..expected.len().max(actual.len()) {
            match (expected.get(i), actual.get(i)) {
                (Some(a), Some(b)) if a == b => {}
                (a, b) => lines.push(DiffLine {
                    line: i + 1,
                    expected: a.map(|s| (*s).to_string()),
                    actual: b.map(|s| (*s).to_string()),
                }),
            }
        }
        SnapshotDiff {
            identical: lines.is_empty() && self.content == other.content,
            lines,
        }
    }
}

/// One differing line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// 1-based line number
    pub line: usize,
    /// Stored line, if any
    pub expected: Option<String>,
    /// New line, if any
    pub actual: Option<String>,
}

/// Result of comparing two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Whether snapshots are identical
    pub identical: bool,
    /// Differing lines
    pub lines: Vec<DiffLine>,
}

impl SnapshotDiff {
    /// Check if snapshots are identical
    #[must_use]
    pub const fn is_identical(&self) -> bool {
        self.identical
    }

    /// Human readable `-`/`+` listing of the differing lines
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            if let Some(expected) = &line.expected {
                let _ = writeln!(out, "{:>4} - {expected}", line.line);
            }
            if let Some(actual) = &line.actual {
                let _ = writeln!(out, "{:>4} + {actual}", line.line);
            }
        }
        out
    }
}

/// File-backed snapshot store
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    config: SnapshotConfig,
}

impl SnapshotStore {
    /// Store using `config`
    #[must_use]
    pub const fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }

    /// Configuration
    #[must_use]
    pub const fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Load a stored snapshot
    pub fn load(&self, name: &str) -> WiringResult<Option<Snapshot>> {
        let path = self.config.path(name);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Snapshot::new(name, fs::read_to_string(path)?)))
    }

    /// Write a snapshot, creating the directory if needed
    pub fn save(&self, snapshot: &Snapshot) -> WiringResult<()> {
        fs::create_dir_all(&self.config.snapshot_dir)?;
        fs::write(self.config.path(&snapshot.name), &snapshot.content)?;
        Ok(())
    }

    /// Compare `content` to the stored snapshot `name`.
    ///
    /// Records on first run and rewrites in update mode; otherwise a
    /// difference fails with [`WiringError::SnapshotMismatch`].
    pub fn assert_matches(&self, name: &str, content: &str) -> WiringResult<()> {
        let actual = Snapshot::new(name, content);
        let Some(stored) = self.load(name)? else {
            tracing::info!(snapshot = name, "recording new snapshot");
            return self.save(&actual);
        };
        let diff = stored.diff(&actual);
        if diff.is_identical() {
            return Ok(());
        }
        if self.config.update_snapshots {
            tracing::info!(snapshot = name, lines = diff.lines.len(), "updating snapshot");
            return self.save(&actual);
        }
        Err(WiringError::SnapshotMismatch {
            name: name.to_string(),
            diff: diff.render(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn store(update: bool) -> (tempfile::TempDir, SnapshotStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = SnapshotConfig::default()
            .with_dir(dir.path().to_string_lossy())
            .with_update(update);
        (dir, SnapshotStore::new(config))
    }

    mod config_tests {
        use super::*;

        #[test]
        fn test_default_config() {
            let config = SnapshotConfig::default();
            assert!(!config.update_snapshots);
            assert_eq!(config.snapshot_dir, "__snapshots__");
        }

        #[test]
        fn test_path_is_sanitized() {
            let config = SnapshotConfig::default().with_dir("snaps");
            assert_eq!(
                config.path("counter list: initial"),
                PathBuf::from("snaps").join("counter_list__initial.snap")
            );
        }
    }

    mod diff_tests {
        use super::*;

        #[test]
        fn test_identical() {
            let a = Snapshot::new("a", "x\ny");
            assert!(a.diff(&a.clone()).is_identical());
        }

        #[test]
        fn test_changed_and_added_lines() {
            let a = Snapshot::new("a", "first: 0\nsecond: 0");
            let b = Snapshot::new("a", "first: 1\nsecond: 0\nthird: 0");
            let diff = a.diff(&b);
            assert!(!diff.is_identical());
            assert_eq!(diff.lines.len(), 2);
            assert_eq!(diff.lines[0].line, 1);
            assert_eq!(diff.lines[1].expected, None);
            assert_eq!(
                diff.render(),
                "   1 - first: 0\n   1 + first: 1\n   3 + third: 0\n"
            );
        }
    }

    mod store_tests {
        use super::*;

        #[test]
        fn test_records_then_matches() {
            let (_dir, store) = store(false);
            store.assert_matches("list", "a\nb").unwrap();
            assert_eq!(store.load("list").unwrap().unwrap().content, "a\nb");
            store.assert_matches("list", "a\nb").unwrap();
        }

        #[test]
        fn test_mismatch_reports_diff() {
            let (_dir, store) = store(false);
            store.assert_matches("list", "a\nb").unwrap();
            let err = store.assert_matches("list", "a\nc").unwrap_err();
            let message = err.to_string();
            assert!(message.starts_with("Snapshot mismatch: list"));
            assert!(message.contains("2 - b"));
            assert!(message.contains("2 + c"));
        }

        #[test]
        fn test_update_mode_rewrites() {
            let (_dir, store) = store(true);
            store.assert_matches("list", "a").unwrap();
            store.assert_matches("list", "b").unwrap();
            assert_eq!(store.load("list").unwrap().unwrap().content, "b");
        }

        #[test]
        fn test_missing_snapshot_loads_none() {
            let (_dir, store) = store(false);
            assert!(store.load("nothing").unwrap().is_none());
        }
    }
}
