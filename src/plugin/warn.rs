use super::batch::{batch_extra_flags, batches_by_directory, build_command, chunk_groups};
use super::workspace::Workspace;
use super::{
    contain_io_failure, debug_info, launch_failure, list_files, read_lines, resource_directories,
    Plugin, PluginBase, ResourceGroup,
};
use crate::config::{PluginKind, WarnPluginConfig};
use crate::error::PluginError;
use crate::results::{check_results, group_by_file, DebugInfo, MatchOptions, TestResult, TestStatus};
use crate::util::file_name;
use crate::warning::WarningParser;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Runs a linter over fixtures and compares the warnings it prints with the
/// `;warn:` markers embedded in them.
#[derive(Debug, Clone)]
pub struct WarnPlugin {
    base: PluginBase,
    config: WarnPluginConfig,
}

/// One file handed to the warn tool.
#[derive(Debug, Clone)]
pub(crate) struct WarnTarget {
    /// File whose markers define the expected warnings.
    pub fixture: PathBuf,
    /// Name the tool is expected to report for this file.
    pub file_name: String,
    /// Path placed on the command line.
    pub argument: PathBuf,
}

impl WarnPlugin {
    pub fn new(base: PluginBase, config: WarnPluginConfig) -> Self {
        Self { base, config }
    }

    fn batches(&self, groups: Vec<ResourceGroup>) -> Vec<(Option<PathBuf>, Vec<ResourceGroup>)> {
        if self.config.wild_card_in_directory_mode.is_some() {
            batches_by_directory(groups)
                .into_iter()
                .map(|(dir, batch)| (Some(dir), batch))
                .collect()
        } else {
            chunk_groups(groups, self.config.batch_size())
                .into_iter()
                .map(|batch| (None, batch))
                .collect()
        }
    }

    fn target(
        &self,
        fixture: &Path,
        parser: &WarningParser,
        copy_dir: Option<&Path>,
    ) -> Result<WarnTarget, PluginError> {
        let name = file_name(fixture);
        let argument = match copy_dir {
            Some(copy_dir) => {
                let stripped = parser.strip_markers(&read_lines(fixture)?);
                Workspace::write_lines(copy_dir, &self.relative_path(fixture, &name), &stripped)?
            }
            None => fixture.to_path_buf(),
        };
        Ok(WarnTarget {
            fixture: fixture.to_path_buf(),
            file_name: name,
            argument,
        })
    }

    fn check_batch(
        &self,
        index: usize,
        dir: Option<PathBuf>,
        batch: &[ResourceGroup],
        parser: &WarningParser,
        workspace: &Workspace,
        uses_copies: bool,
    ) -> Result<Vec<(TestStatus, DebugInfo)>, PluginError> {
        let copy_dir = if uses_copies {
            Some(workspace.batch_dir(index)?)
        } else {
            None
        };
        let targets = batch
            .iter()
            .flatten()
            .map(|fixture| self.target(fixture, parser, copy_dir.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;
        let wildcard = match (&self.config.wild_card_in_directory_mode, dir) {
            (Some(token), Some(dir)) => {
                let dir = match &copy_dir {
                    Some(copy_dir) => copy_dir.join(self.relative_path(&dir, "")),
                    None => dir,
                };
                Some(self.base.relative(&dir.join(token)))
            }
            _ => None,
        };
        check_warnings(&self.base, &self.config, parser, &targets, wildcard)
    }

    fn relative_path(&self, path: &Path, fallback: &str) -> PathBuf {
        path.strip_prefix(&self.base.directory)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(fallback))
    }
}

impl Plugin for WarnPlugin {
    fn kind(&self) -> PluginKind {
        PluginKind::Warn
    }

    fn directory(&self) -> &Path {
        &self.base.directory
    }

    fn discover(&self) -> Result<Vec<ResourceGroup>, PluginError> {
        let pattern = self.config.resource_name_pattern();
        let mut groups = Vec::new();
        for dir in resource_directories(&self.base.directory)? {
            for file in list_files(&dir)? {
                if pattern.matches_entire(&file_name(&file)) {
                    groups.push(vec![file]);
                }
            }
        }
        Ok(self.base.keep(groups))
    }

    fn execute(&self) -> Result<Vec<TestResult>, PluginError> {
        let groups = self.discover()?;
        if groups.is_empty() {
            tracing::debug!(dir = %self.base.directory.display(), "no warn resources");
            return Ok(Vec::new());
        }
        let started = Instant::now();
        tracing::info!(
            dir = %self.base.directory.display(),
            resources = groups.len(),
            "discovered warn test resources"
        );
        let parser = WarningParser::from_config(&self.config)?;
        let workspace = Workspace::new(self.kind(), self.base.executor.counter())?;
        let uses_copies = self.base.general.ignores_save_comments();

        let mut results = Vec::new();
        for (index, (dir, batch)) in self.batches(groups).into_iter().enumerate() {
            tracing::debug!(batch = index, batch_len = batch.len(), "running warn batch");
            let outcome = self.check_batch(index, dir, &batch, &parser, &workspace, uses_copies);
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
            "warn plugin complete"
        );
        Ok(results)
    }
}

/// Run the warn command over one batch and judge every target.
///
/// `wildcard`, when set, replaces the file list on the command line.
pub(crate) fn check_warnings(
    base: &PluginBase,
    config: &WarnPluginConfig,
    parser: &WarningParser,
    targets: &[WarnTarget],
    wildcard: Option<String>,
) -> Result<Vec<(TestStatus, DebugInfo)>, PluginError> {
    let mut expected = Vec::new();
    let mut flags = Vec::with_capacity(targets.len());
    for target in targets {
        let lines = read_lines(&target.fixture)?;
        expected.extend(parser.expected(&target.file_name, &lines));
        flags.push((target.fixture.clone(), parser.extra_flags(&lines)));
    }
    let extra_flags = batch_extra_flags(&flags)?;
    let files = match wildcard {
        Some(argument) => vec![argument],
        None => targets
            .iter()
            .map(|target| base.relative(&target.argument))
            .collect(),
    };
    let command = build_command(
        config.exec_cmd()?,
        config.exec_flags.as_deref(),
        &extra_flags,
        &files,
        config.batch_separator(),
    );

    let execution = match base.run(&command) {
        Ok(execution) => execution,
        Err(err) => {
            let failure = launch_failure(&command, &err);
            return Ok(targets.iter().map(|_| failure.clone()).collect());
        }
    };
    if execution.code != 0 {
        tracing::debug!(exit_code = execution.code, "warn tool exited with non-zero status");
    }

    let fallback = match targets {
        [single] => single.file_name.as_str(),
        _ => "",
    };
    let actual = group_by_file(parser.actual(&execution.stdout, fallback));
    let expected = group_by_file(expected);
    let options = MatchOptions::from_config(config);
    Ok(targets
        .iter()
        .map(|target| {
            let (status, counts) = check_results(&target.file_name, &expected, &actual, &options);
            let mut debug = debug_info(&command, &execution);
            debug.count_warnings = Some(counts);
            (status, debug)
        })
        .collect())
}
