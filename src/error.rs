//! Error taxonomy for configuration, process launch, discovery and plugin runs.
//!
//! Tool verdicts (missing warnings, diff mismatches) are never errors; they
//! are the `Fail` branch of a [`crate::results::TestStatus`].
use std::path::PathBuf;

/// Merge/validation contract violation. Fatal for the config subtree only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Couldn't find `tags` in [general] section. Please provide it in this, or at least in one of the parent configs"
    )]
    MissingTags,

    #[error("[{section}] section: `{field}` must be provided")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },

    #[error("warn-plugin configuration error: {flag} is true but {group} is not provided")]
    LocationGroupMissing {
        flag: &'static str,
        group: &'static str,
    },

    #[error(
        "warn-plugin configuration error: {group} is provided (actual: {group_value}) but {flag} is false"
    )]
    LocationFlagDisabled {
        flag: &'static str,
        group: &'static str,
        group_value: usize,
    },

    #[error(
        "Test files suffix names and batch sizes should be identical for [fix] and [warn] plugins. But found [fix]: {{{fix_suffix}, {fix_batch_size}}}, [warn]: {{{warn_suffix}, {warn_batch_size}}}"
    )]
    FixAndWarnMismatch {
        fix_suffix: String,
        fix_batch_size: usize,
        warn_suffix: String,
        warn_batch_size: usize,
    },

    #[error("[{section}] section: invalid regex for `{field}` ({source_text:?}): {message}")]
    InvalidPattern {
        section: &'static str,
        field: &'static str,
        source_text: String,
        message: String,
    },

    #[error("[{section}] section: {message}")]
    InvalidValue {
        section: &'static str,
        message: String,
    },
}

/// Launcher-level failure. A tool's own non-zero exit is not an error.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Command couldn't be empty!")]
    EmptyCommand,

    #[error("executable {program:?} not found: {message}")]
    ExecutableNotFound { program: String, message: String },

    #[error("could not parse command {command:?}: {message}")]
    MalformedCommand { command: String, message: String },

    #[error("failed to spawn {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process capture I/O failed ({context}): {source}")]
    Capture {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed resource grouping; fatal for one plugin's discovery pass.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error(
        "Files should be grouped in pairs, but for name {name} these files have been discovered: {files:?}"
    )]
    GroupSize { name: String, files: Vec<PathBuf> },

    #[error("pair for {name} lacks a file named with {suffix:?}: {files:?}")]
    MissingPairMember {
        name: String,
        suffix: String,
        files: Vec<PathBuf>,
    },

    #[error("read directory {}: {source}", .path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal failure of one plugin instance.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("extra flags differ inside one batch: {first:?} in {} vs {second:?} in {}", .first_file.display(), .second_file.display())]
    InconsistentExtraFlags {
        first: String,
        first_file: PathBuf,
        second: String,
        second_file: PathBuf,
    },

    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PluginError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PluginError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}
