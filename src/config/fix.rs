use super::general::GeneralConfig;
use super::pattern::Pattern;
use super::warn::DEFAULT_EXTRA_FLAGS_PATTERN;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RESOURCE_NAME_TEST: &str = "Test";
pub const DEFAULT_RESOURCE_NAME_EXPECTED: &str = "Expected";
pub const DEFAULT_DESTINATION_SUFFIX: &str = "_copy";
pub const DEFAULT_BATCH_SIZE: usize = 1;
pub const DEFAULT_BATCH_SEPARATOR: &str = " ";

/// Settings of the plugin that runs a fixer and diffs its output against an
/// expected file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct FixPluginConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_flags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_separator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name_test: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name_expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_file_suffix: Option<String>,
    /// Group 1 of the first matching line of a test file is spliced into
    /// the command at `$args`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_flags_pattern: Option<Pattern>,
}

impl FixPluginConfig {
    /// Combine with the already-merged parent section. `exec_cmd` is the
    /// child's own.
    pub fn merge_with(&self, parent: &FixPluginConfig) -> FixPluginConfig {
        FixPluginConfig {
            exec_cmd: self.exec_cmd.clone(),
            exec_flags: self.exec_flags.clone().or_else(|| parent.exec_flags.clone()),
            batch_size: self.batch_size.or(parent.batch_size),
            batch_separator: self
                .batch_separator
                .clone()
                .or_else(|| parent.batch_separator.clone()),
            resource_name_test: self
                .resource_name_test
                .clone()
                .or_else(|| parent.resource_name_test.clone()),
            resource_name_expected: self
                .resource_name_expected
                .clone()
                .or_else(|| parent.resource_name_expected.clone()),
            destination_file_suffix: self
                .destination_file_suffix
                .clone()
                .or_else(|| parent.destination_file_suffix.clone()),
            extra_flags_pattern: self
                .extra_flags_pattern
                .clone()
                .or_else(|| parent.extra_flags_pattern.clone()),
        }
    }

    pub fn validate_and_set_defaults(
        &self,
        general: Option<&GeneralConfig>,
    ) -> Result<FixPluginConfig, ConfigError> {
        let exec_cmd = self
            .exec_cmd
            .clone()
            .or_else(|| general.and_then(|general| general.exec_cmd.clone()))
            .ok_or(ConfigError::MissingField {
                section: "fix",
                field: "execCmd",
            })?;
        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                section: "fix",
                message: "batchSize must be at least 1".to_string(),
            });
        }
        let resource_name_test = self
            .resource_name_test
            .clone()
            .unwrap_or_else(|| DEFAULT_RESOURCE_NAME_TEST.to_string());
        let resource_name_expected = self
            .resource_name_expected
            .clone()
            .unwrap_or_else(|| DEFAULT_RESOURCE_NAME_EXPECTED.to_string());
        if resource_name_test.is_empty()
            || resource_name_expected.is_empty()
            || resource_name_test == resource_name_expected
        {
            return Err(ConfigError::InvalidValue {
                section: "fix",
                message: format!(
                    "resourceNameTest ({resource_name_test:?}) and resourceNameExpected ({resource_name_expected:?}) must be distinct and non-empty"
                ),
            });
        }

        let extra_flags_pattern = self
            .extra_flags_pattern
            .clone()
            .unwrap_or_else(|| Pattern::new(DEFAULT_EXTRA_FLAGS_PATTERN));
        extra_flags_pattern.checked("fix", "extraFlagsPattern")?;

        Ok(FixPluginConfig {
            exec_cmd: Some(exec_cmd),
            exec_flags: self.exec_flags.clone(),
            batch_size: Some(batch_size),
            batch_separator: Some(
                self.batch_separator
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BATCH_SEPARATOR.to_string()),
            ),
            resource_name_test: Some(resource_name_test),
            resource_name_expected: Some(resource_name_expected),
            destination_file_suffix: Some(
                self.destination_file_suffix
                    .clone()
                    .unwrap_or_else(|| DEFAULT_DESTINATION_SUFFIX.to_string()),
            ),
            extra_flags_pattern: Some(extra_flags_pattern),
        })
    }

    pub fn exec_cmd(&self) -> Result<&str, ConfigError> {
        self.exec_cmd.as_deref().ok_or(ConfigError::MissingField {
            section: "fix",
            field: "execCmd",
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1)
    }

    pub fn batch_separator(&self) -> &str {
        self.batch_separator
            .as_deref()
            .unwrap_or(DEFAULT_BATCH_SEPARATOR)
    }

    pub fn test_suffix(&self) -> &str {
        self.resource_name_test
            .as_deref()
            .unwrap_or(DEFAULT_RESOURCE_NAME_TEST)
    }

    pub fn expected_suffix(&self) -> &str {
        self.resource_name_expected
            .as_deref()
            .unwrap_or(DEFAULT_RESOURCE_NAME_EXPECTED)
    }

    pub fn destination_suffix(&self) -> &str {
        self.destination_file_suffix
            .as_deref()
            .unwrap_or(DEFAULT_DESTINATION_SUFFIX)
    }

    pub fn extra_flags(&self) -> Pattern {
        self.extra_flags_pattern
            .clone()
            .unwrap_or_else(|| Pattern::new(DEFAULT_EXTRA_FLAGS_PATTERN))
    }

    /// `<prefix>(Expected|Test).<ext>`; group 1 is the pairing key.
    pub fn resource_name_pattern(&self) -> Pattern {
        Pattern::new(format!(
            r"(.+)({}|{})\.[\w\d]+",
            regex::escape(self.expected_suffix()),
            regex::escape(self.test_suffix())
        ))
    }
}
