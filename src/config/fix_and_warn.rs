use super::fix::FixPluginConfig;
use super::general::GeneralConfig;
use super::warn::WarnPluginConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Fix followed by a warn check on the fixed files.
///
/// The two nested sections merge and validate independently; afterwards they
/// must name test files the same way and batch them identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixAndWarnPluginConfig {
    pub fix: FixPluginConfig,
    pub warn: WarnPluginConfig,
}

impl FixAndWarnPluginConfig {
    pub fn merge_with(&self, parent: &FixAndWarnPluginConfig) -> FixAndWarnPluginConfig {
        FixAndWarnPluginConfig {
            fix: self.fix.merge_with(&parent.fix),
            warn: self.warn.merge_with(&parent.warn),
        }
    }

    pub fn validate_and_set_defaults(
        &self,
        general: Option<&GeneralConfig>,
    ) -> Result<FixAndWarnPluginConfig, ConfigError> {
        let fix = self.fix.validate_and_set_defaults(general)?;
        let warn = self.warn.validate_and_set_defaults(general)?;
        if fix.test_suffix() != warn.test_suffix() || fix.batch_size() != warn.batch_size() {
            return Err(ConfigError::FixAndWarnMismatch {
                fix_suffix: fix.test_suffix().to_string(),
                fix_batch_size: fix.batch_size(),
                warn_suffix: warn.test_suffix().to_string(),
                warn_batch_size: warn.batch_size(),
            });
        }
        Ok(FixAndWarnPluginConfig { fix, warn })
    }
}
