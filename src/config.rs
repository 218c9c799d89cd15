//! Registry of named databases
//!
//! `config.toml` records which databases exist and which one is the
//! default; the database files themselves live in a separate data folder.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::{Error, Result};

const APP_NAME: &str = "kemist";

/// Environment variable overriding both the config and data folders
pub const HOME_ENV: &str = "KEMIST_HOME";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KemistConfig {
    pub default_database: Option<String>,
    #[serde(default)]
    pub databases: Vec<String>,
}

/// Where the config file and database files live
pub fn default_locations() -> (PathBuf, PathBuf) {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        let home = PathBuf::from(home);
        return (home.join("config.toml"), home.join("databases"));
    }

    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME);
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("databases");
    (config_dir.join("config.toml"), data_dir)
}

pub fn load_config(path: &Path) -> Result<Option<KemistConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)?;
    let config: KemistConfig = toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &KemistConfig) -> Result<()> {
    ensure_parent_dir(path)?;
    let contents = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Loaded registry plus the folders it refers to.
#[derive(Debug)]
pub struct ConfigManager {
    config_file: PathBuf,
    data_dir: PathBuf,
    config: KemistConfig,
}

impl ConfigManager {
    /// Load the registry from the default locations
    pub fn load() -> Result<Self> {
        let (config_file, data_dir) = default_locations();
        Self::load_from(config_file, data_dir)
    }

    /// Load the registry from explicit locations
    pub fn load_from(config_file: PathBuf, data_dir: PathBuf) -> Result<Self> {
        tracing::debug!("Configuration file: {}", config_file.display());
        tracing::debug!("Database storage folder: {}", data_dir.display());

        let config = match load_config(&config_file)? {
            Some(config) => {
                tracing::debug!("Settings: {:?}", config);
                config
            }
            None => {
                tracing::info!("No configuration found. Setting up default values");
                KemistConfig::default()
            }
        };

        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { config_file, data_dir, config })
    }

    pub fn save(&self) -> Result<()> {
        tracing::debug!("Saving configuration to {}", self.config_file.display());
        write_config(&self.config_file, &self.config)
    }

    pub fn databases(&self) -> &[String] {
        &self.config.databases
    }

    pub fn default_database(&self) -> Option<&str> {
        self.config.default_database.as_deref()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.config.databases.iter().any(|known| known == name)
    }

    /// File backing a registered database
    pub fn database_path(&self, name: &str) -> Result<PathBuf> {
        if !self.is_registered(name) {
            tracing::debug!("Known databases are {:?}", self.config.databases);
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        Ok(self.data_dir.join(name))
    }

    /// Pick `name`, or the default database when none is given
    pub fn resolve(&self, name: Option<&str>) -> Result<(String, PathBuf)> {
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let name = self.default_database().ok_or(Error::NoDefaultDatabase)?;
                tracing::info!("Using default database {}", name);
                name.to_string()
            }
        };
        let path = self.database_path(&name)?;
        Ok((name, path))
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.is_registered(name) {
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        self.config.default_database = Some(name.to_string());
        tracing::info!("{} is now the default database", name);
        Ok(())
    }

    /// Register a new database and return the path of its file.
    /// The first database ever registered becomes the default.
    pub fn register(&mut self, name: &str, make_default: bool) -> Result<PathBuf> {
        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return Err(Error::Config(format!("{:?} is not a valid database name", name)));
        }
        if self.is_registered(name) {
            return Err(Error::DuplicateDatabase(name.to_string()));
        }

        self.config.databases.push(name.to_string());
        tracing::info!("Registered new database: {}", name);

        if make_default || self.config.databases.len() == 1 {
            self.set_default(name)?;
        }
        self.database_path(name)
    }

    /// Forget databases whose file disappeared and repair the default.
    /// Returns the forgotten names.
    pub fn clean(&mut self) -> Vec<String> {
        let data_dir = self.data_dir.clone();
        let (kept, removed): (Vec<String>, Vec<String>) = std::mem::take(&mut self.config.databases)
            .into_iter()
            .partition(|name| data_dir.join(name).exists());
        self.config.databases = kept;

        for name in &removed {
            tracing::warn!("Database file for {} is missing, forgetting it", name);
        }

        let default_is_known = self
            .config
            .default_database
            .as_ref()
            .is_some_and(|name| self.is_registered(name));
        if !default_is_known {
            self.config.default_database = self.config.databases.first().cloned();
        }
        removed
    }
}
