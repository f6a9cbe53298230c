//! Shared test infrastructure for integration tests.
//!
//! Suites are laid out in a temporary directory; the tools under test are
//! small `sh` scripts written next to the fixtures.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Echoes every `;warn:L:C: msg` marker of its file arguments as
/// `<file>:L:C: msg`, i.e. a linter that always agrees with the fixtures.
pub const ECHO_LINTER: &str = r#"for f in "$@"; do
  name=$(basename "$f")
  sed -n "s/.*;warn:\([0-9]*\):\([0-9]*\): \(.*\)/$name:\1:\2: \3/p" "$f"
done
"#;

/// Upper-cases every file argument in place.
pub const UPPERCASE_FIXER: &str = r#"for f in "$@"; do
  tr 'a-z' 'A-Z' < "$f" > "$f.tmp" && mv "$f.tmp" "$f"
done
"#;

/// A test suite rooted in a temporary directory.
pub struct Suite {
    dir: TempDir,
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl Suite {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create suite dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, contents).expect("write fixture");
        path
    }

    pub fn config(&self, dir: &str, toml: &str) -> PathBuf {
        let relative = if dir.is_empty() {
            "save.toml".to_string()
        } else {
            format!("{dir}/save.toml")
        };
        self.file(&relative, toml)
    }

    /// Write a tool script; configs call it as `sh <name>`.
    pub fn tool(&self, dir: &str, name: &str, body: &str) -> PathBuf {
        let relative = if dir.is_empty() {
            name.to_string()
        } else {
            format!("{dir}/{name}")
        };
        self.file(&relative, body)
    }

    /// Run the `save` binary against the suite root.
    pub fn run_cli(&self, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_save"))
            .arg(self.root())
            .args(extra)
            .env("RUST_LOG", "warn")
            .output()
            .expect("run save binary")
    }
}
