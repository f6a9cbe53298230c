use super::batch::{batch_extra_flags, build_command, chunk_groups};
use super::workspace::Workspace;
use super::{
    contain_io_failure, debug_info, launch_failure, list_files, read_lines, resource_directories,
    Plugin, PluginBase, ResourceGroup,
};
use crate::config::{FixPluginConfig, PluginKind};
use crate::diff::{diff_lines, format_deltas};
use crate::error::{DiscoveryError, PluginError};
use crate::results::{DebugInfo, TestResult, TestStatus};
use crate::util::file_name;
use crate::warning::{extra_flags, WarningParser};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Runs a fixer on a copy of each `*Test` file and diffs the result against
/// the matching `*Expected` file.
#[derive(Debug, Clone)]
pub struct FixPlugin {
    base: PluginBase,
    config: FixPluginConfig,
}

/// Verdict of one pair after the fixer ran, with the fixed copy.
#[derive(Debug, Clone)]
pub(crate) struct FixedCopy {
    pub copy: PathBuf,
    pub status: TestStatus,
    pub debug_info: DebugInfo,
}

impl FixPlugin {
    pub fn new(base: PluginBase, config: FixPluginConfig) -> Self {
        Self { base, config }
    }
}

impl Plugin for FixPlugin {
    fn kind(&self) -> PluginKind {
        PluginKind::Fix
    }

    fn directory(&self) -> &Path {
        &self.base.directory
    }

    fn discover(&self) -> Result<Vec<ResourceGroup>, PluginError> {
        Ok(self.base.keep(discover_pairs(&self.base, &self.config)?))
    }

    fn execute(&self) -> Result<Vec<TestResult>, PluginError> {
        let pairs = self.discover()?;
        if pairs.is_empty() {
            tracing::debug!(dir = %self.base.directory.display(), "no fix resources");
            return Ok(Vec::new());
        }
        let started = Instant::now();
        tracing::info!(
            dir = %self.base.directory.display(),
            pairs = pairs.len(),
            "discovered file pairs for comparison"
        );
        let workspace = Workspace::new(self.kind(), self.base.executor.counter())?;
        let mut results = Vec::with_capacity(pairs.len());
        for (index, batch) in chunk_groups(pairs, self.config.batch_size())
            .into_iter()
            .enumerate()
        {
            let outcome = workspace
                .batch_dir(index)
                .and_then(|copy_dir| fix_batch(&self.base, &self.config, &batch, &copy_dir, None))
                .map(|fixed| {
                    fixed
                        .into_iter()
                        .map(|fixed| (fixed.status, fixed.debug_info))
                        .collect()
                });
            let outcomes = contain_io_failure(outcome, batch.len())?;
            results.extend(batch.into_iter().zip(outcomes).map(|(resources, (status, debug_info))| {
                TestResult {
                    resources,
                    status,
                    debug_info,
                }
            }));
        }
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis(),
            results = results.len(),
            "fix plugin complete"
        );
        Ok(results)
    }
}

/// `[expected, test]` pairs keyed by the common file-name prefix.
pub(crate) fn discover_pairs(
    base: &PluginBase,
    config: &FixPluginConfig,
) -> Result<Vec<ResourceGroup>, PluginError> {
    let pattern = config.resource_name_pattern();
    let mut pairs = Vec::new();
    for dir in resource_directories(&base.directory)? {
        let mut by_prefix: BTreeMap<String, Vec<(PathBuf, String)>> = BTreeMap::new();
        for file in list_files(&dir)? {
            let name = file_name(&file);
            if let Some(captures) = pattern.captures_entire(&name) {
                by_prefix
                    .entry(captures[1].to_string())
                    .or_default()
                    .push((file.clone(), captures[2].to_string()));
            }
        }
        for (prefix, members) in by_prefix {
            pairs.push(pair(&dir, prefix, members, config)?);
        }
    }
    Ok(pairs)
}

fn pair(
    dir: &Path,
    prefix: String,
    members: Vec<(PathBuf, String)>,
    config: &FixPluginConfig,
) -> Result<ResourceGroup, DiscoveryError> {
    let files = || members.iter().map(|(path, _)| path.clone()).collect::<Vec<_>>();
    let name = dir.join(&prefix).display().to_string();
    if members.len() != 2 {
        return Err(DiscoveryError::GroupSize {
            name,
            files: files(),
        });
    }
    let find = |suffix: &str| {
        members
            .iter()
            .find(|(_, kind)| kind == suffix)
            .map(|(path, _)| path.clone())
            .ok_or_else(|| DiscoveryError::MissingPairMember {
                name: name.clone(),
                suffix: suffix.to_string(),
                files: files(),
            })
    };
    Ok(vec![find(config.expected_suffix())?, find(config.test_suffix())?])
}

/// Copy every test file, run the fixer once over the copies, and diff each
/// copy against its expected file. With `strip`, expectation markers are
/// removed from both sides first.
pub(crate) fn fix_batch(
    base: &PluginBase,
    config: &FixPluginConfig,
    pairs: &[ResourceGroup],
    copy_dir: &Path,
    strip: Option<&WarningParser>,
) -> Result<Vec<FixedCopy>, PluginError> {
    let clean = |lines: Vec<String>| match strip {
        Some(parser) => parser.strip_markers(&lines),
        None => lines,
    };
    let flags_pattern = config.extra_flags();
    let flags_regex = flags_pattern.checked("fix", "extraFlagsPattern")?;
    let mut copies = Vec::with_capacity(pairs.len());
    let mut flags = Vec::with_capacity(pairs.len());
    for group in pairs {
        let (Some(expected), Some(test)) = (group.first(), group.last()) else {
            continue;
        };
        let relative = test
            .strip_prefix(&base.directory)
            .unwrap_or(test.as_path())
            .with_file_name(copy_name(test, config.destination_suffix()));
        let lines = read_lines(test)?;
        flags.push((test.clone(), extra_flags(flags_regex, &lines)));
        let copy = Workspace::write_lines(copy_dir, &relative, &clean(lines))?;
        copies.push((expected.clone(), copy));
    }
    let batch_flags = batch_extra_flags(&flags)?;

    let files: Vec<String> = copies.iter().map(|(_, copy)| base.relative(copy)).collect();
    let command = build_command(
        config.exec_cmd()?,
        config.exec_flags.as_deref(),
        &batch_flags,
        &files,
        config.batch_separator(),
    );
    let execution = match base.run(&command) {
        Ok(execution) => execution,
        Err(err) => {
            let (status, debug_info) = launch_failure(&command, &err);
            return Ok(copies
                .into_iter()
                .map(|(_, copy)| FixedCopy {
                    copy,
                    status: status.clone(),
                    debug_info: debug_info.clone(),
                })
                .collect());
        }
    };

    let mut fixed = Vec::with_capacity(copies.len());
    for (expected_path, copy) in copies {
        let expected = clean(read_lines(&expected_path)?);
        let actual = read_lines(&copy)?;
        let deltas = diff_lines(&expected, &actual);
        let status = if deltas.is_empty() {
            TestStatus::pass(
                "fixed file matches expected",
                format!("{} matches {}", file_name(&copy), file_name(&expected_path)),
            )
        } else {
            TestStatus::fail(
                format!(
                    "{} differs from {} in {} place(s)",
                    file_name(&copy),
                    file_name(&expected_path),
                    deltas.len()
                ),
                format_deltas(&deltas),
            )
        };
        fixed.push(FixedCopy {
            copy,
            status,
            debug_info: debug_info(&command, &execution),
        });
    }
    Ok(fixed)
}

/// `ATest.java` with suffix `_copy` becomes `ATest_copy.java`.
fn copy_name(test: &Path, suffix: &str) -> String {
    let stem = test
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    match test.extension() {
        Some(extension) => format!("{stem}{suffix}.{}", extension.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    }
}
