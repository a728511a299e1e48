//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: an optional TOML file supplied by the caller
//! 3. Environment variables: `HIERARCHY__*` prefix
//!
//! The engine never loads configuration itself; callers pass the resulting
//! [`BuildSettings`] to the builder.

use std::path::Path;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};

/// Controls how closures are precomputed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildSettings {
    /// Compute per-origin closures on the rayon pool
    pub parallel: bool,
    /// Minimum number of entries before the parallel path is taken
    pub parallel_threshold: usize,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 512,
        }
    }
}

/// Raw build settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawBuildSettings {
    pub parallel: Option<bool>,
    pub parallel_threshold: Option<usize>,
}

impl BuildSettings {
    /// Overlay wins where it specifies a value.
    pub fn merge(&self, overlay: &RawBuildSettings) -> Self {
        Self {
            parallel: overlay.parallel.unwrap_or(self.parallel),
            parallel_threshold: overlay
                .parallel_threshold
                .unwrap_or(self.parallel_threshold),
        }
    }
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub build: RawBuildSettings,
}

/// Unified configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub build: BuildSettings,
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> ApplicationResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional TOML file; keys it leaves out keep their defaults
    ///
    /// # Errors
    /// `ApplicationError::Config` if the file cannot be read or parsed, or an
    /// environment override has the wrong type.
    pub fn load(config_file: Option<&Path>) -> ApplicationResult<Self> {
        let mut current = Self::default();

        if let Some(path) = config_file {
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        debug!(?current, "Settings loaded");
        Ok(current)
    }

    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            build: self.build.merge(&overlay.build),
        }
    }

    /// Apply HIERARCHY__* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> ApplicationResult<Self> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("HIERARCHY").separator("__"))
            .build()
            .map_err(config_err)?;

        match config.get_bool("build.parallel") {
            Ok(val) => settings.build.parallel = val,
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }
        match config.get_int("build.parallel_threshold") {
            Ok(val) => {
                settings.build.parallel_threshold =
                    usize::try_from(val).map_err(|e| ApplicationError::Config {
                        message: format!("build.parallel_threshold: {e}"),
                    })?;
            }
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> ApplicationResult<String> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# hierarchy-closure configuration
#
# Precedence (lowest to highest):
#   Defaults compiled into the library
#   This file (keys left out keep their defaults)
#   Env: HIERARCHY__BUILD__PARALLEL, HIERARCHY__BUILD__PARALLEL_THRESHOLD

[build]
# Compute closures on the rayon thread pool
# parallel = true

# Entry count from which the parallel build kicks in
# parallel_threshold = 512
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
