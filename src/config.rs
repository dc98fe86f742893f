//! Launcher configuration file.
//!
//! The configuration is a JSON document, given explicitly or discovered in
//! the working directory, that fixes how the executable is launched and
//! supplies site defaults for the request values.

use crate::command::LaunchMode;
use crate::launcher::{LaunchSettings, Spawner};
use crate::models::request::InvocationRequest;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

/// File name looked for in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "ultrasound4d.json";

/// Contents of a configuration file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    pub launch: LaunchMode,
    pub spawner: Spawner,
    /// Values applied over the built-in defaults before any command-line value.
    pub values: InvocationRequest,
}

impl LauncherConfig {
    pub fn settings(&self) -> LaunchSettings {
        LaunchSettings {
            mode: self.launch.clone(),
            spawner: self.spawner.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file '{0}' does not exist")]
    Missing(PathBuf),
    #[error("failed to read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Looks for [`CONFIG_FILE_NAME`] in `dir`.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
}

/// Reads and parses the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<LauncherConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the configuration to use.
///
/// An `explicit` path must exist. Without one, [`CONFIG_FILE_NAME`] is
/// looked up in `dir`, and built-in defaults are used when it is absent.
/// Returns the path the configuration came from, if any.
pub fn resolve_config(
    explicit: Option<&Path>,
    dir: &Path,
) -> Result<(LauncherConfig, Option<PathBuf>), ConfigError> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(dir),
    };

    match path {
        Some(path) => {
            debug!("Loading launcher config from '{}'", path.display());
            let config = load_config(&path)?;
            Ok((config, Some(path)))
        }
        None => {
            debug!("No launcher config found, using built-in defaults");
            Ok((LauncherConfig::default(), None))
        }
    }
}
