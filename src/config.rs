//! Configuration loading.
//!
//! Settings come from a YAML file (`<config dir>/azvm/config.yaml` unless
//! `--config`/`AZVM_CONFIG` points elsewhere). The standard `AZURE_*`
//! environment variables override the credential section.

use std::path::{Path, PathBuf};

use azvm_azure::diagnostics::ResolverSettings;
use azvm_azure::types::{AzureConfig, AzureCredentials};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Polling behaviour for `create-vm --wait`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OperationSettings {
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for OperationSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            timeout_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AzvmConfig {
    pub credentials: AzureCredentials,
    pub azure: AzureConfig,
    pub diagnostics: ResolverSettings,
    pub operations: OperationSettings,
}

impl AzvmConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("azvm").join("config.yaml"))
    }

    /// Load from `explicit`, which must exist, or from the default path when
    /// present. Environment overrides are applied afterwards.
    pub fn load(explicit: Option<&Path>) -> CliResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> CliResult<Self> {
        debug!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text, path)
    }

    pub fn from_yaml_str(text: &str, origin: &Path) -> CliResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| CliError::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Override credentials from `AZURE_*` variables looked up via `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let creds = &mut self.credentials;
        let overrides: [(&str, &mut String); 4] = [
            ("AZURE_TENANT_ID", &mut creds.tenant_id),
            ("AZURE_CLIENT_ID", &mut creds.client_id),
            ("AZURE_CLIENT_SECRET", &mut creds.client_secret),
            ("AZURE_SUBSCRIPTION_ID", &mut creds.subscription_id),
        ];
        for (key, slot) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.diagnostics.max_name_attempts == 0 {
            return Err(CliError::InvalidArgument(
                "diagnostics.max_name_attempts must be at least 1".into(),
            ));
        }
        if self.operations.poll_interval_secs == 0 {
            return Err(CliError::InvalidArgument(
                "operations.poll_interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
