use super::pattern::Pattern;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Free-form metadata shared by every plugin of a test suite.
///
/// All fields stay optional until [`GeneralConfig::validate_and_set_defaults`]
/// so merging can tell "unset" apart from an explicit value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suite_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_tests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_tests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_warnings_pattern: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_save_comments: Option<bool>,
}

impl GeneralConfig {
    /// Combine with the already-merged parent section.
    ///
    /// Tags are unioned parent-first; every other field is the child's value
    /// when set, otherwise the parent's.
    pub fn merge_with(&self, parent: &GeneralConfig) -> GeneralConfig {
        GeneralConfig {
            tags: merge_tags(parent.tags.as_deref(), self.tags.as_deref()),
            description: self.description.clone().or_else(|| parent.description.clone()),
            suite_name: self.suite_name.clone().or_else(|| parent.suite_name.clone()),
            excluded_tests: self
                .excluded_tests
                .clone()
                .or_else(|| parent.excluded_tests.clone()),
            included_tests: self
                .included_tests
                .clone()
                .or_else(|| parent.included_tests.clone()),
            exec_cmd: self.exec_cmd.clone().or_else(|| parent.exec_cmd.clone()),
            expected_warnings_pattern: self
                .expected_warnings_pattern
                .clone()
                .or_else(|| parent.expected_warnings_pattern.clone()),
            ignore_save_comments: self.ignore_save_comments.or(parent.ignore_save_comments),
        }
    }

    pub fn validate_and_set_defaults(&self) -> Result<GeneralConfig, ConfigError> {
        if self.tags.is_none() {
            return Err(ConfigError::MissingTags);
        }
        if let Some(pattern) = &self.expected_warnings_pattern {
            pattern.checked("general", "expectedWarningsPattern")?;
        }
        Ok(GeneralConfig {
            excluded_tests: Some(self.excluded_tests.clone().unwrap_or_default()),
            included_tests: Some(self.included_tests.clone().unwrap_or_default()),
            ignore_save_comments: Some(self.ignore_save_comments.unwrap_or(false)),
            ..self.clone()
        })
    }

    pub fn tag_list(&self) -> Vec<String> {
        split_list(self.tags.as_deref())
    }

    pub fn included_list(&self) -> Vec<String> {
        split_list(self.included_tests.as_deref())
    }

    pub fn excluded_list(&self) -> Vec<String> {
        split_list(self.excluded_tests.as_deref())
    }

    pub fn ignores_save_comments(&self) -> bool {
        self.ignore_save_comments.unwrap_or(false)
    }
}

/// Ordered-set union of two comma-separated tag lists, first occurrence wins.
pub fn merge_tags(parent: Option<&str>, child: Option<&str>) -> Option<String> {
    if parent.is_none() && child.is_none() {
        return None;
    }
    let mut merged: Vec<String> = Vec::new();
    for tag in split_list(parent).into_iter().chain(split_list(child)) {
        if !merged.contains(&tag) {
            merged.push(tag);
        }
    }
    Some(merged.join(", "))
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
