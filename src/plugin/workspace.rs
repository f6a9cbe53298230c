use crate::config::PluginKind;
use crate::error::PluginError;
use crate::process::TempNameCounter;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory for the copies one plugin run hands to the tool.
///
/// Each plugin kind gets its own segment under a fresh temporary directory.
/// Everything is removed when the workspace drops.
#[derive(Debug)]
pub struct Workspace {
    _root: TempDir,
    dir: PathBuf,
}

impl Workspace {
    pub fn new(kind: PluginKind, counter: &TempNameCounter) -> Result<Self, PluginError> {
        let id = counter.next_id();
        let root = tempfile::Builder::new()
            .prefix(&format!("save_{id}_"))
            .tempdir()
            .map_err(|source| PluginError::io("create workspace", std::env::temp_dir(), source))?;
        let dir = root.path().join(segment(kind));
        fs::create_dir_all(&dir).map_err(|source| PluginError::io("create", &dir, source))?;
        tracing::debug!(kind = %kind, dir = %dir.display(), "created plugin workspace");
        Ok(Self { _root: root, dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Directory for batch `index`, created on demand.
    pub fn batch_dir(&self, index: usize) -> Result<PathBuf, PluginError> {
        let dir = self.dir.join(format!("batch_{index}"));
        fs::create_dir_all(&dir).map_err(|source| PluginError::io("create", &dir, source))?;
        Ok(dir)
    }

    /// Write `lines` to `relative` under `dir`, creating parents.
    pub fn write_lines(dir: &Path, relative: &Path, lines: &[String]) -> Result<PathBuf, PluginError> {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PluginError::io("create", parent, source))?;
        }
        let mut text = lines.join("\n");
        if !lines.is_empty() {
            text.push('\n');
        }
        fs::write(&path, text).map_err(|source| PluginError::io("write", &path, source))?;
        Ok(path)
    }
}

fn segment(kind: PluginKind) -> &'static str {
    match kind {
        PluginKind::Warn => "WarnPlugin",
        PluginKind::Fix => "FixPlugin",
        PluginKind::FixAndWarn => "FixAndWarnPlugin",
    }
}
