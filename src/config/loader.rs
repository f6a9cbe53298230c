use super::tree::{ConfigTree, NodeId};
use super::Sections;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "save.toml";

/// A config file that could not be loaded; its directory subtree is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadFailure {
    pub location: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct LoadedTree {
    pub tree: ConfigTree,
    pub failures: Vec<LoadFailure>,
}

/// Parse the text of one `save.toml`.
pub fn parse_sections(text: &str) -> Result<Sections> {
    let sections: Sections = toml::from_str(text).context("parse save.toml")?;
    Ok(sections)
}

pub fn read_sections(path: &Path) -> Result<Sections> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    parse_sections(&text).with_context(|| format!("in {}", path.display()))
}

/// Build the config tree under `root`, which must hold a `save.toml`.
///
/// Every directory with its own `save.toml` becomes a node whose parent is
/// the nearest ancestor directory's node. A file that fails to parse is
/// reported and its whole directory subtree is left out.
pub fn load_tree(root: &Path) -> Result<LoadedTree> {
    let root_config = root.join(CONFIG_FILE_NAME);
    if !root_config.is_file() {
        return Err(anyhow!(
            "no {CONFIG_FILE_NAME} found in test root {}",
            root.display()
        ));
    }
    let sections = read_sections(&root_config)?;
    let mut loaded = LoadedTree::default();
    let root_id = loaded.tree.insert(root_config, None, sections)?;
    walk(root, root_id, &mut loaded)?;
    tracing::info!(
        configs = loaded.tree.len(),
        skipped = loaded.failures.len(),
        root = %root.display(),
        "config tree loaded"
    );
    Ok(loaded)
}

fn walk(dir: &Path, parent: NodeId, loaded: &mut LoadedTree) -> Result<()> {
    for child in sorted_subdirectories(dir)? {
        let config_path = child.join(CONFIG_FILE_NAME);
        if !config_path.is_file() {
            walk(&child, parent, loaded)?;
            continue;
        }
        match read_sections(&config_path) {
            Ok(sections) => {
                let id = loaded.tree.insert(config_path, Some(parent), sections)?;
                walk(&child, id, loaded)?;
            }
            Err(err) => {
                tracing::error!(
                    location = %config_path.display(),
                    error = %format!("{err:#}"),
                    "config skipped with its subtree"
                );
                loaded.failures.push(LoadFailure {
                    location: config_path,
                    message: format!("{err:#}"),
                });
            }
        }
    }
    Ok(())
}

pub(crate) fn sorted_subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
