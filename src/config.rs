//! Engine configuration
//!
//! Settings are read from an optional TOML file; every key has a default, so
//! a missing file or an empty table is a valid configuration.
//!
//! ```toml
//! default_policy = "proportional"
//! allow_overpayment = false
//!
//! [batch]
//! batch_size = 500
//! max_concurrent = 4
//! ```

use crate::strategy::BatchConfig;
use crate::types::{AllocationPolicy, SchoolError};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Rules the payment engines apply to every record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentRules {
    /// Policy used when a record names none
    pub default_policy: AllocationPolicy,
    /// Accept payments above the outstanding balance and credit the excess
    /// to the school bucket
    pub allow_overpayment: bool,
}

/// `[batch]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSettings {
    pub batch_size: Option<usize>,
    pub max_concurrent: Option<usize>,
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchoolConfig {
    pub default_policy: AllocationPolicy,
    pub allow_overpayment: bool,
    pub batch: BatchSettings,
}

impl SchoolConfig {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if the file does not exist
    /// * `InvalidConfig` if it is not valid TOML or a value is out of range
    pub fn load(path: &Path) -> Result<Self, SchoolError> {
        if !path.exists() {
            return Err(SchoolError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let raw = std::fs::read_to_string(path)?;
        let config = Self::parse(&raw)?;
        debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SchoolError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, SchoolError> {
        let config: SchoolConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject explicit zero batch settings
    ///
    /// Zero values given on the command line fall back to defaults with a
    /// warning instead; a config file is expected to be deliberate.
    pub fn validate(&self) -> Result<(), SchoolError> {
        if self.batch.batch_size == Some(0) {
            return Err(SchoolError::invalid_config(
                "batch.batch_size",
                "must be greater than zero",
            ));
        }
        if self.batch.max_concurrent == Some(0) {
            return Err(SchoolError::invalid_config(
                "batch.max_concurrent",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn payment_rules(&self) -> PaymentRules {
        PaymentRules {
            default_policy: self.default_policy,
            allow_overpayment: self.allow_overpayment,
        }
    }

    /// Batch settings with command-line overrides applied
    pub fn batch_config(
        &self,
        batch_size: Option<usize>,
        max_concurrent: Option<usize>,
    ) -> BatchConfig {
        let default = BatchConfig::default();
        BatchConfig::new(
            batch_size
                .or(self.batch.batch_size)
                .unwrap_or(default.batch_size),
            max_concurrent
                .or(self.batch.max_concurrent)
                .unwrap_or(default.max_concurrent_batches),
        )
    }
}
