//! CLI configuration

use crate::error::{CliError, CliResult};
use lineage_resolver::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LineageConfig {
    /// Directory of exported histories (`<execution_id>/<run_id>.json`)
    pub history_dir: Option<PathBuf>,

    /// Resolver settings
    pub resolver: ResolverConfig,
}

impl LineageConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => match Self::default_config_path() {
                Some(p) => p,
                None => return Ok(LineageConfig::default()),
            },
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: LineageConfig =
                toml::from_str(&contents).map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        } else {
            Ok(LineageConfig::default())
        }
    }

    /// Get the default configuration file path
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lineage").join("config.toml"))
    }

    /// The history directory, or an error naming how to set one
    pub fn require_history_dir(&self) -> CliResult<PathBuf> {
        self.history_dir.clone().ok_or_else(|| {
            CliError::Config(
                "no history directory configured (use --history-dir or set history_dir)".into(),
            )
        })
    }
}
