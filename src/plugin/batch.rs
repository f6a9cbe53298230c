use super::ResourceGroup;
use crate::error::PluginError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const ARGS_PLACEHOLDER: &str = "$args";
const FILES_PLACEHOLDER: &str = "$files";

/// Fixed-size chunks in discovery order.
pub fn chunk_groups(groups: Vec<ResourceGroup>, batch_size: usize) -> Vec<Vec<ResourceGroup>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::new();
    let mut current = Vec::with_capacity(batch_size);
    for group in groups {
        current.push(group);
        if current.len() == batch_size {
            batches.push(std::mem::replace(&mut current, Vec::with_capacity(batch_size)));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// One batch per directory, keyed by the directory of each group's last file.
pub fn batches_by_directory(groups: Vec<ResourceGroup>) -> Vec<(PathBuf, Vec<ResourceGroup>)> {
    let mut by_dir: BTreeMap<PathBuf, Vec<ResourceGroup>> = BTreeMap::new();
    for group in groups {
        let dir = group
            .last()
            .and_then(|path| path.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        by_dir.entry(dir).or_default().push(group);
    }
    by_dir.into_iter().collect()
}

/// Extra flags shared by every file of a batch.
///
/// Files may leave the marker out only if every other file does too.
pub fn batch_extra_flags(per_file: &[(PathBuf, String)]) -> Result<String, PluginError> {
    let Some((first_file, first)) = per_file.first() else {
        return Ok(String::new());
    };
    for (file, flags) in &per_file[1..] {
        if flags != first {
            return Err(PluginError::InconsistentExtraFlags {
                first: first.clone(),
                first_file: first_file.clone(),
                second: flags.clone(),
                second_file: file.clone(),
            });
        }
    }
    Ok(first.clone())
}

/// Command line for one batch.
///
/// Starts from `exec_cmd [exec_flags]`; `$args` is replaced with the extra
/// flags (or they are appended), then `$files` with the joined file list
/// (or it is appended).
pub fn build_command(
    exec_cmd: &str,
    exec_flags: Option<&str>,
    extra_flags: &str,
    files: &[String],
    separator: &str,
) -> String {
    let mut command = exec_cmd.trim().to_string();
    if let Some(flags) = exec_flags.map(str::trim).filter(|flags| !flags.is_empty()) {
        command.push(' ');
        command.push_str(flags);
    }
    command = substitute(command, ARGS_PLACEHOLDER, extra_flags.trim());
    substitute(command, FILES_PLACEHOLDER, &files.join(separator))
}

fn substitute(command: String, placeholder: &str, value: &str) -> String {
    if command.contains(placeholder) {
        return command.replace(placeholder, value);
    }
    if value.is_empty() {
        return command;
    }
    format!("{command} {value}")
}
