//! Whole-tree run: resolve every config node, execute its plugins, and keep
//! fatal failures local to the node or plugin that raised them.
use crate::config::{load_tree, ConfigTree, LoadFailure, NodeId, PluginKind};
use crate::plugin::{build_plugins, RunOptions};
use crate::process::{ProcessExecutor, TempNameCounter};
use crate::results::TestResult;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A config subtree or plugin that could not produce verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    pub location: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<PluginKind>,
    pub message: String,
}

impl From<LoadFailure> for RunFailure {
    fn from(failure: LoadFailure) -> Self {
        RunFailure {
            location: failure.location,
            plugin: None,
            message: failure.message,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub results: Vec<TestResult>,
    pub failures: Vec<RunFailure>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.status.is_pass())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    /// True when every verdict passed and nothing failed fatally.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.failed() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    executor: ProcessExecutor,
    options: RunOptions,
}

impl Engine {
    pub fn new(options: RunOptions) -> Self {
        Self::with_executor(ProcessExecutor::new(TempNameCounter::new()), options)
    }

    pub fn with_executor(executor: ProcessExecutor, options: RunOptions) -> Self {
        Self { executor, options }
    }

    /// Load the config tree under `root` and run it.
    pub fn run(&self, root: &Path) -> Result<RunReport> {
        let loaded = load_tree(root)?;
        let failures = loaded.failures.into_iter().map(RunFailure::from).collect();
        Ok(self.run_tree(&loaded.tree, failures))
    }

    /// Run every node in pre-order. A node whose config does not resolve is
    /// reported once and its whole subtree is skipped; a failing plugin only
    /// loses its own verdicts.
    pub fn run_tree(&self, tree: &ConfigTree, failures: Vec<RunFailure>) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport {
            results: Vec::new(),
            failures,
        };
        let mut skipped: Vec<NodeId> = Vec::new();
        for id in tree.preorder() {
            if skipped.iter().any(|root| tree.is_within(id, *root)) {
                continue;
            }
            let node = tree.node(id);
            let resolved = match tree.resolve(id) {
                Ok(resolved) => resolved,
                Err(err) => {
                    tracing::error!(
                        location = %node.location.display(),
                        error = %err,
                        "invalid configuration; skipping subtree"
                    );
                    report.failures.push(RunFailure {
                        location: node.location.clone(),
                        plugin: None,
                        message: err.to_string(),
                    });
                    skipped.push(id);
                    continue;
                }
            };
            for plugin in build_plugins(&resolved, &self.executor, &self.options) {
                match plugin.execute() {
                    Ok(results) => report.results.extend(results),
                    Err(err) => {
                        tracing::error!(
                            location = %node.location.display(),
                            plugin = %plugin.kind(),
                            error = %err,
                            "plugin failed"
                        );
                        report.failures.push(RunFailure {
                            location: node.location.clone(),
                            plugin: Some(plugin.kind()),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis(),
            results = report.results.len(),
            passed = report.passed(),
            failures = report.failures.len(),
            "test run complete"
        );
        report
    }
}
