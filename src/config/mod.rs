use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::timing::DEFAULT_SERVICE_TIMEOUT_SECS;


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Path of the client executable; empty means "discover it"
    pub client_executable_path: String,

    /// Argument string passed to the client
    pub client_arguments: String,

    /// Register the launcher to run at boot
    pub auto_start_on_boot: bool,

    /// Seconds to wait for a service to reach Running
    pub service_start_timeout_seconds: i64,

    /// Ask the UI to minimise after a successful launch
    pub minimize_on_complete: bool,

    /// Show every progress message, not just the final outcome
    pub show_status_updates: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            client_executable_path: String::new(),
            client_arguments: String::new(),
            auto_start_on_boot: true,
            service_start_timeout_seconds: DEFAULT_SERVICE_TIMEOUT_SECS as i64,
            minimize_on_complete: true,
            show_status_updates: true,
        }
    }
}

impl Configuration {
    /// Service start timeout, falling back to the default for non-positive values
    pub fn service_timeout(&self) -> Duration {
        if self.service_start_timeout_seconds > 0 {
            Duration::from_secs(self.service_start_timeout_seconds as u64)
        } else {
            Duration::from_secs(DEFAULT_SERVICE_TIMEOUT_SECS)
        }
    }

    /// Configured client path, if it names an existing file
    pub fn resolved_client_path(&self) -> Option<PathBuf> {
        if self.client_executable_path.trim().is_empty() {
            return None;
        }
        let path = PathBuf::from(&self.client_executable_path);
        path.is_file().then_some(path)
    }

    /// Set a field from its key name, as used by `config set`
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "client_executable_path" => self.client_executable_path = value.to_string(),
            "client_arguments" => self.client_arguments = value.to_string(),
            "auto_start_on_boot" => self.auto_start_on_boot = parse_bool(key, value)?,
            "service_start_timeout_seconds" => {
                let secs: i64 = value
                    .parse()
                    .with_context(|| format!("{} must be an integer", key))?;
                if secs <= 0 {
                    anyhow::bail!("{} must be greater than zero", key);
                }
                self.service_start_timeout_seconds = secs;
            }
            "minimize_on_complete" => self.minimize_on_complete = parse_bool(key, value)?,
            "show_status_updates" => self.show_status_updates = parse_bool(key, value)?,
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("{} must be true or false", key))
}

/// Owned handle to the persisted configuration.
///
/// The record is read from disk on first access and cached; every mutation is
/// written back immediately.
pub struct ConfigStore {
    path: PathBuf,
    cache: Mutex<Option<Configuration>>,
}

impl ConfigStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: Mutex::new(None),
        }
    }

    /// `<config dir>/poslauncher/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine configuration directory")?;
        Ok(config_dir.join("poslauncher").join("config.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current configuration, loading it on first call
    pub fn get(&self) -> Configuration {
        let mut cache = self.lock();
        if let Some(config) = cache.as_ref() {
            return config.clone();
        }

        let config = self.load_or_default();
        *cache = Some(config.clone());
        config
    }

    /// Drop the cached record and read it again from disk
    pub fn reload(&self) -> Configuration {
        let config = self.load_or_default();
        *self.lock() = Some(config.clone());
        config
    }

    /// Replace the whole record and persist it
    pub fn save(&self, config: Configuration) -> Result<()> {
        *self.lock() = Some(config.clone());
        self.write(&config)
    }

    /// Mutate the record in place and persist it
    pub fn update<F>(&self, f: F) -> Result<Configuration>
    where
        F: FnOnce(&mut Configuration),
    {
        let mut config = self.get();
        f(&mut config);
        self.save(config.clone())?;
        Ok(config)
    }

    pub fn update_client_settings(&self, path: &str, arguments: &str) -> Result<Configuration> {
        self.update(|config| {
            config.client_executable_path = path.to_string();
            config.client_arguments = arguments.to_string();
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Configuration>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_or_default(&self) -> Configuration {
        if self.path.exists() {
            match read_config(&self.path) {
                Ok(config) => {
                    debug!("Loaded configuration from {}", self.path.display());
                    return config;
                }
                Err(e) => {
                    warn!(
                        "Ignoring unreadable configuration at {}: {:#}",
                        self.path.display(),
                        e
                    );
                }
            }
        }

        let config = Configuration::default();
        if let Err(e) = self.write(&config) {
            warn!("Failed to write default configuration: {:#}", e);
        }
        config
    }

    fn write(&self, config: &Configuration) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create configuration directory {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write configuration to {}", self.path.display()))?;
        debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<Configuration> {
    let content = std::fs::read_to_string(path).context("Failed to read configuration")?;
    let config: Configuration = toml::from_str(&content).context("Failed to parse configuration")?;
    Ok(config)
}
