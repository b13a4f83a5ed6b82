//! Player configuration.
//!
//! Read from an optional `skald.toml`. Every key has a default, so an empty or
//! absent file is a valid configuration.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV_VAR: &str = "SKALD_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "skald.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkaldConfig {
    pub session: SessionConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Testbed used when none is named on the command line.
    pub default_testbed: Option<String>,
    pub show_logic: bool,
    pub show_signals: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_testbed: None,
            show_logic: false,
            show_signals: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Keep REPL history in the platform data directory.
    pub history: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { history: true }
    }
}

/// Where the configuration comes from. Only the implicit default may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Flag(PathBuf),
    Env(PathBuf),
    Implicit(PathBuf),
}

impl ConfigSource {
    /// Pick the config path: `--config`, then `$SKALD_CONFIG`, then `./skald.toml`.
    pub fn resolve(flag: Option<&Path>, env_value: Option<OsString>) -> Self {
        if let Some(path) = flag {
            return ConfigSource::Flag(path.to_path_buf());
        }
        match env_value {
            Some(value) if !value.is_empty() => ConfigSource::Env(PathBuf::from(value)),
            _ => ConfigSource::Implicit(PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ConfigSource::Flag(path) | ConfigSource::Env(path) | ConfigSource::Implicit(path) => path,
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, ConfigSource::Implicit(_))
    }
}

/// Load configuration using the standard lookup order.
///
/// # Errors
/// An explicitly named file that is missing or malformed, or a malformed `./skald.toml`.
pub fn load_config(flag: Option<&Path>) -> Result<SkaldConfig> {
    load_config_from(&ConfigSource::resolve(flag, env::var_os(CONFIG_ENV_VAR)))
}

pub fn load_config_from(source: &ConfigSource) -> Result<SkaldConfig> {
    let path = source.path();
    if !source.is_required() && !path.exists() {
        info!("no {} found, using default configuration", path.display());
        return Ok(SkaldConfig::default());
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading config from '{}'", path.display()))?;
    let config = toml::from_str(&text).with_context(|| format!("parsing config TOML from '{}'", path.display()))?;
    info!("configuration loaded from {}", path.display());
    Ok(config)
}
