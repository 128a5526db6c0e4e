//! Service configuration
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `MHR_`-prefixed environment variables (e.g. `MHR_BIND_ADDR`).

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "MHR";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Listen address for the HTTP server
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Directory holding the training artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            artifacts_dir: default_artifacts_dir(),
            log_level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            if !path.exists() {
                bail!(
                    "Configuration file {} not found (specified via --config)",
                    path.display()
                );
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid service configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_file_values_and_defaults() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "bind_addr = \"127.0.0.1:8080\"")?;
        writeln!(file, "artifacts_dir = \"/srv/models\"")?;
        file.flush()?;

        let config = ServiceConfig::load(Some(file.path()))?;
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.artifacts_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.log_level, "info");
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(ServiceConfig::load(Some(Path::new("/nonexistent/service.toml"))).is_err());
    }
}
