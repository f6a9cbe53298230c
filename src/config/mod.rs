//! Hierarchical test configuration: section types, the directory tree of
//! config nodes, and loading `save.toml` files from disk.
pub mod fix;
pub mod fix_and_warn;
pub mod general;
pub mod loader;
pub mod pattern;
pub mod tree;
pub mod warn;

pub use fix::FixPluginConfig;
pub use fix_and_warn::FixAndWarnPluginConfig;
pub use general::GeneralConfig;
pub use loader::{load_tree, LoadFailure, LoadedTree, CONFIG_FILE_NAME};
pub use pattern::Pattern;
pub use tree::{ConfigNode, ConfigTree, NodeId, ResolvedConfig};
pub use warn::WarnPluginConfig;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of plugin section a config node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    Warn,
    Fix,
    FixAndWarn,
}

impl PluginKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PluginKind::Warn => "warn",
            PluginKind::Fix => "fix",
            PluginKind::FixAndWarn => "fix and warn",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All sections of one config node, at most one per kind.
///
/// This is also the shape of a `save.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Sections {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn: Option<WarnPluginConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixPluginConfig>,
    #[serde(rename = "fix and warn", skip_serializing_if = "Option::is_none")]
    pub fix_and_warn: Option<FixAndWarnPluginConfig>,
}

impl Sections {
    /// Merge every kind independently with the already-merged parent.
    ///
    /// A kind missing here is inherited wholesale; a kind present on both
    /// sides merges field by field.
    pub fn merge_with_parent(&self, parent: &Sections) -> Sections {
        Sections {
            general: merge_section(&self.general, &parent.general, GeneralConfig::merge_with),
            warn: merge_section(&self.warn, &parent.warn, WarnPluginConfig::merge_with),
            fix: merge_section(&self.fix, &parent.fix, FixPluginConfig::merge_with),
            fix_and_warn: merge_section(
                &self.fix_and_warn,
                &parent.fix_and_warn,
                FixAndWarnPluginConfig::merge_with,
            ),
        }
    }

    /// Validate every present section, General first so plugin sections can
    /// fall back to its command and expected-warning pattern.
    pub fn validate_and_set_defaults(&self) -> Result<Sections, ConfigError> {
        let general = self
            .general
            .as_ref()
            .ok_or(ConfigError::MissingTags)?
            .validate_and_set_defaults()?;
        let warn = self
            .warn
            .as_ref()
            .map(|warn| warn.validate_and_set_defaults(Some(&general)))
            .transpose()?;
        let fix = self
            .fix
            .as_ref()
            .map(|fix| fix.validate_and_set_defaults(Some(&general)))
            .transpose()?;
        let fix_and_warn = self
            .fix_and_warn
            .as_ref()
            .map(|both| both.validate_and_set_defaults(Some(&general)))
            .transpose()?;
        Ok(Sections {
            general: Some(general),
            warn,
            fix,
            fix_and_warn,
        })
    }

    /// Plugin kinds present, in execution order.
    pub fn plugin_kinds(&self) -> Vec<PluginKind> {
        let mut kinds = Vec::new();
        if self.fix.is_some() {
            kinds.push(PluginKind::Fix);
        }
        if self.fix_and_warn.is_some() {
            kinds.push(PluginKind::FixAndWarn);
        }
        if self.warn.is_some() {
            kinds.push(PluginKind::Warn);
        }
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.general.is_none() && self.plugin_kinds().is_empty()
    }
}

fn merge_section<T: Clone>(child: &Option<T>, parent: &Option<T>, merge: fn(&T, &T) -> T) -> Option<T> {
    match (child, parent) {
        (Some(child), Some(parent)) => Some(merge(child, parent)),
        (Some(child), None) => Some(child.clone()),
        (None, parent) => parent.clone(),
    }
}
