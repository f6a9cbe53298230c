use super::general::GeneralConfig;
use super::pattern::Pattern;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Expected warnings in fixtures, e.g. `// ;warn:2:4: Class name in incorrect case`.
pub const DEFAULT_INPUT_PATTERN: &str = r";warn:(\d+):(\d+): (.+)";
/// Actual warnings in tool output, e.g. `src/ClassNameTest.java:2:4: Class name in incorrect case`.
pub const DEFAULT_OUTPUT_PATTERN: &str = r"(.+):(\d+):(\d+): (.+)";
pub const DEFAULT_EXTRA_FLAGS_PATTERN: &str = r"save-args:\s*(.+)";
pub const DEFAULT_TEST_NAME_SUFFIX: &str = "Test";
pub const DEFAULT_BATCH_SIZE: usize = 1;
pub const DEFAULT_BATCH_SEPARATOR: &str = " ";
pub const DEFAULT_LINE_PLACEHOLDER: &str = "$line";
pub const DEFAULT_REGEX_DELIMITERS: [&str; 2] = ["{{", "}}"];

const DEFAULT_FILE_NAME_GROUP_OUT: usize = 1;
const DEFAULT_LINE_GROUP_OUT: usize = 2;
const DEFAULT_COLUMN_GROUP_OUT: usize = 3;
const DEFAULT_MESSAGE_GROUP_OUT: usize = 4;

/// Settings of the plugin that checks emitted warnings against fixture markers.
///
/// Fields default to `None` instead of their natural value because merging
/// cannot otherwise tell a user-provided value from a default. Defaults are
/// applied by [`WarnPluginConfig::validate_and_set_defaults`].
///
/// Capture group indices start at 0, with 0 being the whole match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct WarnPluginConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec_flags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings_input_pattern: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings_output_pattern: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_text_has_line: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning_text_has_column: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_capture_group: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_capture_group: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_capture_group: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name_capture_group_out: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_capture_group_out: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_capture_group_out: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_capture_group_out: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_warnings_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_name_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_separator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wild_card_in_directory_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_warn_text_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_for_regex_in_warning: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_flags_pattern: Option<Pattern>,
}

impl WarnPluginConfig {
    /// Combine with the already-merged parent section.
    ///
    /// `exec_cmd` and `message_capture_group` always come from `self`; every
    /// other field falls back to the parent independently.
    pub fn merge_with(&self, parent: &WarnPluginConfig) -> WarnPluginConfig {
        WarnPluginConfig {
            exec_cmd: self.exec_cmd.clone(),
            exec_flags: self.exec_flags.clone().or_else(|| parent.exec_flags.clone()),
            warnings_input_pattern: self
                .warnings_input_pattern
                .clone()
                .or_else(|| parent.warnings_input_pattern.clone()),
            warnings_output_pattern: self
                .warnings_output_pattern
                .clone()
                .or_else(|| parent.warnings_output_pattern.clone()),
            warning_text_has_line: self.warning_text_has_line.or(parent.warning_text_has_line),
            warning_text_has_column: self
                .warning_text_has_column
                .or(parent.warning_text_has_column),
            line_capture_group: self.line_capture_group.or(parent.line_capture_group),
            column_capture_group: self.column_capture_group.or(parent.column_capture_group),
            message_capture_group: self.message_capture_group,
            file_name_capture_group_out: self
                .file_name_capture_group_out
                .or(parent.file_name_capture_group_out),
            line_capture_group_out: self
                .line_capture_group_out
                .or(parent.line_capture_group_out),
            column_capture_group_out: self
                .column_capture_group_out
                .or(parent.column_capture_group_out),
            message_capture_group_out: self
                .message_capture_group_out
                .or(parent.message_capture_group_out),
            exact_warnings_match: self.exact_warnings_match.or(parent.exact_warnings_match),
            test_name_suffix: self
                .test_name_suffix
                .clone()
                .or_else(|| parent.test_name_suffix.clone()),
            batch_size: self.batch_size.or(parent.batch_size),
            batch_separator: self
                .batch_separator
                .clone()
                .or_else(|| parent.batch_separator.clone()),
            wild_card_in_directory_mode: self
                .wild_card_in_directory_mode
                .clone()
                .or_else(|| parent.wild_card_in_directory_mode.clone()),
            partial_warn_text_match: self
                .partial_warn_text_match
                .or(parent.partial_warn_text_match),
            pattern_for_regex_in_warning: self
                .pattern_for_regex_in_warning
                .clone()
                .or_else(|| parent.pattern_for_regex_in_warning.clone()),
            line_placeholder: self
                .line_placeholder
                .clone()
                .or_else(|| parent.line_placeholder.clone()),
            extra_flags_pattern: self
                .extra_flags_pattern
                .clone()
                .or_else(|| parent.extra_flags_pattern.clone()),
        }
    }

    /// Fill defaults and check cross-field invariants.
    ///
    /// `general` supplies the fallback command and expected-warning pattern.
    /// Running this on its own output returns the same value.
    pub fn validate_and_set_defaults(
        &self,
        general: Option<&GeneralConfig>,
    ) -> Result<WarnPluginConfig, ConfigError> {
        let exec_cmd = self
            .exec_cmd
            .clone()
            .or_else(|| general.and_then(|general| general.exec_cmd.clone()))
            .ok_or(ConfigError::MissingField {
                section: "warn",
                field: "execCmd",
            })?;
        let message_capture_group = self.message_capture_group.ok_or(ConfigError::MissingField {
            section: "warn",
            field: "messageCaptureGroup",
        })?;
        let warning_text_has_line = location_flag(
            self.warning_text_has_line,
            self.line_capture_group,
            "warningTextHasLine",
            "lineCaptureGroup",
        )?;
        let warning_text_has_column = location_flag(
            self.warning_text_has_column,
            self.column_capture_group,
            "warningTextHasColumn",
            "columnCaptureGroup",
        )?;

        let batch_size = self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                section: "warn",
                message: "batchSize must be at least 1".to_string(),
            });
        }
        let delimiters = self.pattern_for_regex_in_warning.clone().unwrap_or_else(|| {
            DEFAULT_REGEX_DELIMITERS
                .iter()
                .map(|delimiter| delimiter.to_string())
                .collect()
        });
        if delimiters.len() != 2 || delimiters.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidValue {
                section: "warn",
                message: format!(
                    "patternForRegexInWarning needs an opening and a closing delimiter, got {delimiters:?}"
                ),
            });
        }

        let warnings_input_pattern = self
            .warnings_input_pattern
            .clone()
            .or_else(|| general.and_then(|general| general.expected_warnings_pattern.clone()))
            .unwrap_or_else(|| Pattern::new(DEFAULT_INPUT_PATTERN));
        let warnings_output_pattern = self
            .warnings_output_pattern
            .clone()
            .unwrap_or_else(|| Pattern::new(DEFAULT_OUTPUT_PATTERN));
        let extra_flags_pattern = self
            .extra_flags_pattern
            .clone()
            .unwrap_or_else(|| Pattern::new(DEFAULT_EXTRA_FLAGS_PATTERN));
        warnings_input_pattern.checked("warn", "warningsInputPattern")?;
        warnings_output_pattern.checked("warn", "warningsOutputPattern")?;
        extra_flags_pattern.checked("warn", "extraFlagsPattern")?;

        Ok(WarnPluginConfig {
            exec_cmd: Some(exec_cmd),
            exec_flags: self.exec_flags.clone(),
            warnings_input_pattern: Some(warnings_input_pattern),
            warnings_output_pattern: Some(warnings_output_pattern),
            warning_text_has_line: Some(warning_text_has_line),
            warning_text_has_column: Some(warning_text_has_column),
            line_capture_group: self.line_capture_group,
            column_capture_group: self.column_capture_group,
            message_capture_group: Some(message_capture_group),
            file_name_capture_group_out: Some(
                self.file_name_capture_group_out
                    .unwrap_or(DEFAULT_FILE_NAME_GROUP_OUT),
            ),
            line_capture_group_out: Some(
                self.line_capture_group_out.unwrap_or(DEFAULT_LINE_GROUP_OUT),
            ),
            column_capture_group_out: Some(
                self.column_capture_group_out
                    .unwrap_or(DEFAULT_COLUMN_GROUP_OUT),
            ),
            message_capture_group_out: Some(
                self.message_capture_group_out
                    .unwrap_or(DEFAULT_MESSAGE_GROUP_OUT),
            ),
            exact_warnings_match: Some(self.exact_warnings_match.unwrap_or(true)),
            test_name_suffix: Some(
                self.test_name_suffix
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TEST_NAME_SUFFIX.to_string()),
            ),
            batch_size: Some(batch_size),
            batch_separator: Some(
                self.batch_separator
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BATCH_SEPARATOR.to_string()),
            ),
            wild_card_in_directory_mode: self.wild_card_in_directory_mode.clone(),
            partial_warn_text_match: Some(self.partial_warn_text_match.unwrap_or(false)),
            pattern_for_regex_in_warning: Some(delimiters),
            line_placeholder: Some(
                self.line_placeholder
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LINE_PLACEHOLDER.to_string()),
            ),
            extra_flags_pattern: Some(extra_flags_pattern),
        })
    }

    pub fn exec_cmd(&self) -> Result<&str, ConfigError> {
        self.exec_cmd.as_deref().ok_or(ConfigError::MissingField {
            section: "warn",
            field: "execCmd",
        })
    }

    pub fn message_group(&self) -> Result<usize, ConfigError> {
        self.message_capture_group.ok_or(ConfigError::MissingField {
            section: "warn",
            field: "messageCaptureGroup",
        })
    }

    pub fn input_pattern(&self) -> Pattern {
        self.warnings_input_pattern
            .clone()
            .unwrap_or_else(|| Pattern::new(DEFAULT_INPUT_PATTERN))
    }

    pub fn output_pattern(&self) -> Pattern {
        self.warnings_output_pattern
            .clone()
            .unwrap_or_else(|| Pattern::new(DEFAULT_OUTPUT_PATTERN))
    }

    pub fn extra_flags(&self) -> Pattern {
        self.extra_flags_pattern
            .clone()
            .unwrap_or_else(|| Pattern::new(DEFAULT_EXTRA_FLAGS_PATTERN))
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
        self.test_name_suffix
            .as_deref()
            .unwrap_or(DEFAULT_TEST_NAME_SUFFIX)
    }

    /// File names accepted as warn fixtures: `<name><suffix>.<ext>`.
    pub fn resource_name_pattern(&self) -> Pattern {
        Pattern::new(format!(r"(.+){}\.[\w\d]+", regex::escape(self.test_suffix())))
    }

    pub fn exact_match(&self) -> bool {
        self.exact_warnings_match.unwrap_or(true)
    }

    pub fn partial_match(&self) -> bool {
        self.partial_warn_text_match.unwrap_or(false)
    }

    pub fn delimiters(&self) -> (String, String) {
        match self.pattern_for_regex_in_warning.as_deref() {
            Some([open, close]) => (open.clone(), close.clone()),
            _ => (
                DEFAULT_REGEX_DELIMITERS[0].to_string(),
                DEFAULT_REGEX_DELIMITERS[1].to_string(),
            ),
        }
    }

    pub fn placeholder(&self) -> &str {
        self.line_placeholder
            .as_deref()
            .unwrap_or(DEFAULT_LINE_PLACEHOLDER)
    }
}

fn location_flag(
    flag_value: Option<bool>,
    group_value: Option<usize>,
    flag: &'static str,
    group: &'static str,
) -> Result<bool, ConfigError> {
    match (flag_value, group_value) {
        (Some(true), None) => Err(ConfigError::LocationGroupMissing { flag, group }),
        (Some(false), Some(group_value)) => Err(ConfigError::LocationFlagDisabled {
            flag,
            group,
            group_value,
        }),
        (Some(value), _) => Ok(value),
        (None, group_value) => Ok(group_value.is_some()),
    }
}

#[cfg(test)]
#[path = "warn_tests.rs"]
mod tests;
