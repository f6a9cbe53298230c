use super::batch::chunk_groups;
use super::fix::{discover_pairs, fix_batch};
use super::warn::{check_warnings, WarnTarget};
use super::workspace::Workspace;
use super::{contain_io_failure, Plugin, PluginBase, ResourceGroup};
use crate::config::{FixAndWarnPluginConfig, PluginKind};
use crate::error::PluginError;
use crate::results::{DebugInfo, TestResult, TestStatus};
use crate::util::file_name;
use crate::warning::WarningParser;
use std::path::Path;
use std::time::Instant;

/// Fixes each test file, then checks the warnings the linter reports on the
/// fixed copy against the markers of the original.
#[derive(Debug, Clone)]
pub struct FixAndWarnPlugin {
    base: PluginBase,
    config: FixAndWarnPluginConfig,
}

impl FixAndWarnPlugin {
    pub fn new(base: PluginBase, config: FixAndWarnPluginConfig) -> Self {
        Self { base, config }
    }

    fn check_batch(
        &self,
        index: usize,
        batch: &[ResourceGroup],
        parser: &WarningParser,
        workspace: &Workspace,
    ) -> Result<Vec<(TestStatus, DebugInfo)>, PluginError> {
        let copy_dir = workspace.batch_dir(index)?;
        let fixed = fix_batch(&self.base, &self.config.fix, batch, &copy_dir, Some(parser))?;
        let targets: Vec<WarnTarget> = batch
            .iter()
            .zip(&fixed)
            .filter_map(|(pair, fixed)| {
                pair.last().map(|test| WarnTarget {
                    fixture: test.clone(),
                    file_name: file_name(&fixed.copy),
                    argument: fixed.copy.clone(),
                })
            })
            .collect();
        let warned = check_warnings(&self.base, &self.config.warn, parser, &targets, None)?;
        Ok(fixed
            .iter()
            .zip(warned)
            .map(|(fixed, (warn_status, warn_debug))| {
                (
                    combine_status(&fixed.status, &warn_status),
                    combine_debug(&fixed.debug_info, warn_debug),
                )
            })
            .collect())
    }
}

impl Plugin for FixAndWarnPlugin {
    fn kind(&self) -> PluginKind {
        PluginKind::FixAndWarn
    }

    fn directory(&self) -> &Path {
        &self.base.directory
    }

    fn discover(&self) -> Result<Vec<ResourceGroup>, PluginError> {
        Ok(self.base.keep(discover_pairs(&self.base, &self.config.fix)?))
    }

    fn execute(&self) -> Result<Vec<TestResult>, PluginError> {
        let pairs = self.discover()?;
        if pairs.is_empty() {
            tracing::debug!(dir = %self.base.directory.display(), "no fix and warn resources");
            return Ok(Vec::new());
        }
        let started = Instant::now();
        tracing::info!(
            dir = %self.base.directory.display(),
            pairs = pairs.len(),
            "discovered file pairs for fix and warn"
        );
        let parser = WarningParser::from_config(&self.config.warn)?;
        let workspace = Workspace::new(self.kind(), self.base.executor.counter())?;

        let mut results = Vec::with_capacity(pairs.len());
        for (index, batch) in chunk_groups(pairs, self.config.fix.batch_size())
            .into_iter()
            .enumerate()
        {
            let outcome = self.check_batch(index, &batch, &parser, &workspace);
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
            "fix and warn plugin complete"
        );
        Ok(results)
    }
}

/// Pass only when both phases pass; messages keep both phases.
fn combine_status(fix: &TestStatus, warn: &TestStatus) -> TestStatus {
    let short = format!("[fix] {} [warn] {}", fix.short(), warn.short());
    let long = format!("[fix] {}\n[warn] {}", fix.long(), warn.long());
    if fix.is_pass() && warn.is_pass() {
        TestStatus::pass(short, long)
    } else {
        TestStatus::fail(short, long)
    }
}

fn combine_debug(fix: &DebugInfo, warn: DebugInfo) -> DebugInfo {
    let join = |first: &str, second: &str| match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{first}\n{second}"),
    };
    DebugInfo {
        command: join(&fix.command, &warn.command),
        stdout: join(&fix.stdout, &warn.stdout),
        stderr: join(&fix.stderr, &warn.stderr),
        exit_code: match (fix.exit_code, warn.exit_code) {
            (Some(0), code) | (None, code) => code,
            (code, _) => code,
        },
        count_warnings: warn.count_warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_status_needs_both_phases() {
        let pass = TestStatus::pass("ok", "all good");
        let fail = TestStatus::fail("bad", "details");
        assert!(combine_status(&pass, &pass).is_pass());
        assert!(!combine_status(&pass, &fail).is_pass());
        assert!(!combine_status(&fail, &pass).is_pass());
        assert_eq!(combine_status(&fail, &pass).short(), "[fix] bad [warn] ok");
    }

    #[test]
    fn combined_debug_keeps_first_failing_exit_code() {
        let fix = DebugInfo {
            command: "fixer a".to_string(),
            exit_code: Some(2),
            ..DebugInfo::default()
        };
        let warn = DebugInfo {
            command: "linter a".to_string(),
            exit_code: Some(1),
            ..DebugInfo::default()
        };
        let combined = combine_debug(&fix, warn);
        assert_eq!(combined.command, "fixer a\nlinter a");
        assert_eq!(combined.exit_code, Some(2));
    }
}
