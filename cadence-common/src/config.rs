//! Bootstrap configuration file resolution and loading
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CADENCE_CONFIG` by default)
//! 3. Per-user config file (`<config dir>/cadence/config.toml`)
//! 4. System config file (`/etc/cadence/config.toml`, Unix only)
//! 5. None: built-in defaults
//!
//! A path named explicitly (CLI or environment) must exist; the implicit
//! locations are only used when present. Missing implicit files are not an
//! error: the caller gets defaults and a warning.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Default environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "CADENCE_CONFIG";

/// Where a resolved config path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    CommandLine,
    Environment,
    UserFile,
    SystemFile,
}

/// A resolved config file location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub origin: ConfigOrigin,
}

impl ConfigSource {
    /// Explicitly named paths must exist
    fn is_explicit(&self) -> bool {
        matches!(self.origin, ConfigOrigin::CommandLine | ConfigOrigin::Environment)
    }
}

/// Resolves which TOML file (if any) configures a module
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    module_name: String,
    env_var: String,
    user_config_dir: Option<PathBuf>,
    system_config_dir: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(module_name: &str) -> Self {
        let system_config_dir = if cfg!(unix) {
            Some(PathBuf::from("/etc/cadence"))
        } else {
            None
        };

        Self {
            module_name: module_name.to_string(),
            env_var: CONFIG_ENV_VAR.to_string(),
            user_config_dir: dirs::config_dir().map(|d| d.join("cadence")),
            system_config_dir,
        }
    }

    /// Use a different environment variable than `CADENCE_CONFIG`
    pub fn with_env_var(mut self, env_var: &str) -> Self {
        self.env_var = env_var.to_string();
        self
    }

    /// Override the implicit search directories (tests, packaging)
    pub fn with_search_dirs(mut self, user: Option<PathBuf>, system: Option<PathBuf>) -> Self {
        self.user_config_dir = user;
        self.system_config_dir = system;
        self
    }

    /// Resolve the config file location by priority
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<ConfigSource> {
        if let Some(path) = cli_arg {
            return Some(ConfigSource {
                path: path.to_path_buf(),
                origin: ConfigOrigin::CommandLine,
            });
        }

        if let Ok(path) = std::env::var(&self.env_var) {
            if !path.trim().is_empty() {
                return Some(ConfigSource {
                    path: PathBuf::from(path),
                    origin: ConfigOrigin::Environment,
                });
            }
        }

        let candidates = [
            (self.user_config_dir.as_ref(), ConfigOrigin::UserFile),
            (self.system_config_dir.as_ref(), ConfigOrigin::SystemFile),
        ];
        for (dir, origin) in candidates {
            if let Some(dir) = dir {
                let path = dir.join("config.toml");
                if path.exists() {
                    return Some(ConfigSource { path, origin });
                }
            }
        }

        None
    }

    /// Resolve and load a TOML config, falling back to defaults
    pub fn load<T>(&self, cli_arg: Option<&Path>) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.resolve(cli_arg) {
            Some(source) => {
                if !source.path.exists() {
                    if source.is_explicit() {
                        return Err(Error::Config(format!(
                            "config file {} ({:?}) does not exist",
                            source.path.display(),
                            source.origin
                        )));
                    }
                    warn!(
                        "{}: config file {} vanished, using built-in defaults",
                        self.module_name,
                        source.path.display()
                    );
                    return Ok(T::default());
                }
                info!(
                    "{}: loading config from {} ({:?})",
                    self.module_name,
                    source.path.display(),
                    source.origin
                );
                load_toml_file(&source.path)
            }
            None => {
                warn!("{}: no config file found, using built-in defaults", self.module_name);
                Ok(T::default())
            }
        }
    }
}

/// Parse a TOML file into `T`
pub fn load_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    let parsed = toml::from_str(&contents)?;
    Ok(parsed)
}
