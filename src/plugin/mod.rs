//! Plugins turn one resolved config node into verdicts: discover resource
//! groups, batch them, run the external tool, and judge its output.
pub mod batch;
pub mod fix;
pub mod fix_and_warn;
pub mod warn;
pub mod workspace;

pub use fix::FixPlugin;
pub use fix_and_warn::FixAndWarnPlugin;
pub use warn::WarnPlugin;

use crate::config::{GeneralConfig, PluginKind, ResolvedConfig, CONFIG_FILE_NAME};
use crate::error::{DiscoveryError, PluginError};
use crate::process::{ExecutionResult, ProcessExecutor};
use crate::results::{DebugInfo, TestResult, TestStatus};
use crate::util::{bounded_snippet, display_path, file_name};
use std::fs;
use std::path::{Path, PathBuf};

/// Related fixture files judged together, e.g. `[expected, test]`.
pub type ResourceGroup = Vec<PathBuf>;

const SNIPPET_MAX_LINES: usize = 60;
const SNIPPET_MAX_BYTES: usize = 8 * 1024;

pub trait Plugin {
    fn kind(&self) -> PluginKind;

    /// Directory of the config node the plugin was built from.
    fn directory(&self) -> &Path;

    /// Resource groups under the node's resource directories, after filtering.
    fn discover(&self) -> Result<Vec<ResourceGroup>, PluginError>;

    /// Run the tool over every discovered group; one result per group.
    fn execute(&self) -> Result<Vec<TestResult>, PluginError>;
}

/// Caller-side knobs shared by every plugin of a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Explicit test file names or paths; empty means all.
    pub test_files: Vec<String>,
    /// Where captured tool stdout is also written.
    pub redirect_to: Option<PathBuf>,
}

/// State every plugin kind carries besides its own section.
#[derive(Debug, Clone)]
pub struct PluginBase {
    pub directory: PathBuf,
    pub general: GeneralConfig,
    pub filter: FileFilter,
    pub executor: ProcessExecutor,
    pub redirect_to: Option<PathBuf>,
}

impl PluginBase {
    pub fn new(resolved: &ResolvedConfig, executor: ProcessExecutor, options: &RunOptions) -> Self {
        let general = resolved.sections.general.clone().unwrap_or_default();
        let filter = FileFilter {
            explicit: options.test_files.clone(),
            included: general.included_list(),
            excluded: general.excluded_list(),
        };
        Self {
            directory: resolved.directory.clone(),
            general,
            filter,
            executor,
            redirect_to: options.redirect_to.clone(),
        }
    }

    /// Run a batch command in the node directory.
    pub(crate) fn run(&self, command: &str) -> Result<ExecutionResult, crate::error::ProcessError> {
        self.executor
            .exec(command, &self.directory, self.redirect_to.as_deref())
    }

    pub(crate) fn relative(&self, path: &Path) -> String {
        display_path(path, Some(&self.directory))
    }

    pub(crate) fn keep(&self, groups: Vec<ResourceGroup>) -> Vec<ResourceGroup> {
        groups
            .into_iter()
            .filter(|group| self.filter.accepts(group, &self.directory))
            .collect()
    }
}

/// Build the plugins for every plugin section of a resolved node.
pub fn build_plugins(
    resolved: &ResolvedConfig,
    executor: &ProcessExecutor,
    options: &RunOptions,
) -> Vec<Box<dyn Plugin>> {
    let base = PluginBase::new(resolved, executor.clone(), options);
    let sections = &resolved.sections;
    let mut plugins: Vec<Box<dyn Plugin>> = Vec::new();
    for kind in sections.plugin_kinds() {
        match kind {
            PluginKind::Fix => {
                if let Some(config) = &sections.fix {
                    plugins.push(Box::new(FixPlugin::new(base.clone(), config.clone())));
                }
            }
            PluginKind::FixAndWarn => {
                if let Some(config) = &sections.fix_and_warn {
                    plugins.push(Box::new(FixAndWarnPlugin::new(base.clone(), config.clone())));
                }
            }
            PluginKind::Warn => {
                if let Some(config) = &sections.warn {
                    plugins.push(Box::new(WarnPlugin::new(base.clone(), config.clone())));
                }
            }
        }
    }
    plugins
}

/// File-name filters from the command line and the general section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    pub explicit: Vec<String>,
    pub included: Vec<String>,
    pub excluded: Vec<String>,
}

impl FileFilter {
    /// A group passes when one of its files is named explicitly (or no names
    /// were given), is included (or nothing is), and none is excluded.
    pub fn accepts(&self, group: &[PathBuf], base: &Path) -> bool {
        let named = |names: &[String]| {
            group.iter().any(|path| {
                let name = file_name(path);
                let relative = display_path(path, Some(base));
                names
                    .iter()
                    .any(|wanted| *wanted == name || *wanted == relative || path.ends_with(wanted))
            })
        };
        (self.explicit.is_empty() || named(&self.explicit))
            && (self.included.is_empty() || named(&self.included))
            && !named(&self.excluded)
    }
}

/// The node directory plus nested directories that have no config of their
/// own; those with a `save.toml` belong to their own node.
pub fn resource_directories(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut dirs = vec![root.to_path_buf()];
    let mut index = 0;
    while index < dirs.len() {
        let current = dirs[index].clone();
        for child in list_entries(&current)? {
            if child.is_dir() && !child.join(CONFIG_FILE_NAME).is_file() {
                dirs.push(child);
            }
        }
        index += 1;
    }
    Ok(dirs)
}

/// Regular files directly inside `dir`, sorted by path.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    Ok(list_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .collect())
}

fn list_entries(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let read_error = |source| DiscoveryError::ListDirectory {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        entries.push(entry.map_err(read_error)?.path());
    }
    entries.sort();
    Ok(entries)
}

/// Fixture lines; bytes that are not UTF-8 are replaced, not rejected.
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>, PluginError> {
    let bytes = fs::read(path).map_err(|source| PluginError::io("read", path, source))?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Turn a file-level failure of one batch into a Fail verdict per group, so
/// the plugin's other batches still report. Other errors pass through.
pub(crate) fn contain_io_failure(
    outcome: Result<Vec<(TestStatus, DebugInfo)>, PluginError>,
    groups: usize,
) -> Result<Vec<(TestStatus, DebugInfo)>, PluginError> {
    match outcome {
        Err(err @ PluginError::Io { .. }) => {
            tracing::error!(error = %err, groups, "batch failed before its verdicts");
            let failure = (
                TestStatus::fail(
                    "failed to prepare batch",
                    format!("failed to prepare batch: {err}"),
                ),
                DebugInfo {
                    stderr: err.to_string(),
                    ..DebugInfo::default()
                },
            );
            Ok(vec![failure; groups])
        }
        other => other,
    }
}

pub(crate) fn debug_info(command: &str, execution: &ExecutionResult) -> DebugInfo {
    DebugInfo {
        command: command.to_string(),
        stdout: bounded_snippet(&execution.stdout, SNIPPET_MAX_LINES, SNIPPET_MAX_BYTES),
        stderr: bounded_snippet(&execution.stderr, SNIPPET_MAX_LINES, SNIPPET_MAX_BYTES),
        exit_code: Some(execution.code),
        count_warnings: None,
    }
}

/// Verdict for groups whose batch could not be launched.
pub(crate) fn launch_failure(command: &str, err: &crate::error::ProcessError) -> (TestStatus, DebugInfo) {
    tracing::error!(command, error = %err, "failed to launch tool");
    (
        TestStatus::fail(
            format!("failed to execute `{command}`"),
            format!("failed to execute `{command}`: {err}"),
        ),
        DebugInfo {
            command: command.to_string(),
            stderr: err.to_string(),
            ..DebugInfo::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn resource_directories_stop_at_nested_configs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("ATest.kt"));
        touch(&root.join("plain/deeper/BTest.kt"));
        touch(&root.join("own").join(CONFIG_FILE_NAME));
        touch(&root.join("own/CTest.kt"));

        let dirs = resource_directories(root).unwrap();
        assert_eq!(
            dirs,
            vec![
                root.to_path_buf(),
                root.join("plain"),
                root.join("plain/deeper"),
            ]
        );
        assert_eq!(list_files(root).unwrap(), vec![root.join("ATest.kt")]);
    }

    #[test]
    fn read_lines_replaces_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ATest.kt");
        fs::write(&path, b"fun a() {}\n// caf\xe9\n").unwrap();
        let lines = read_lines(&path).unwrap();
        assert_eq!(lines, vec!["fun a() {}", "// caf\u{fffd}"]);
    }

    #[test]
    fn io_failure_fails_only_its_batch() {
        let missing = Path::new("/suite/gone/ATest.kt");
        let err = PluginError::io("read", missing, std::io::ErrorKind::NotFound.into());
        let outcomes = contain_io_failure(Err(err), 2).unwrap();
        assert_eq!(outcomes.len(), 2);
        for (status, debug) in &outcomes {
            assert!(!status.is_pass());
            assert!(debug.stderr.contains("gone/ATest.kt"), "{}", debug.stderr);
        }

        let flags = PluginError::InconsistentExtraFlags {
            first: "-a".to_string(),
            first_file: PathBuf::from("A"),
            second: "-b".to_string(),
            second_file: PathBuf::from("B"),
        };
        assert!(matches!(
            contain_io_failure(Err(flags), 2),
            Err(PluginError::InconsistentExtraFlags { .. })
        ));
    }

    #[test]
    fn filter_combines_explicit_included_and_excluded() {
        let base = Path::new("/suite");
        let group = vec![PathBuf::from("/suite/dir/ATest.kt")];
        let other = vec![PathBuf::from("/suite/BTest.kt")];

        let explicit = FileFilter {
            explicit: vec!["dir/ATest.kt".to_string()],
            ..FileFilter::default()
        };
        assert!(explicit.accepts(&group, base));
        assert!(!explicit.accepts(&other, base));

        let included = FileFilter {
            included: vec!["BTest.kt".to_string()],
            ..FileFilter::default()
        };
        assert!(!included.accepts(&group, base));
        assert!(included.accepts(&other, base));

        let excluded = FileFilter {
            excluded: vec!["ATest.kt".to_string()],
            ..FileFilter::default()
        };
        assert!(!excluded.accepts(&group, base));
        assert!(FileFilter::default().accepts(&group, base));
    }
}
