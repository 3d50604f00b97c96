use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

fn default_uploads_url_prefix() -> String {
    "/uploads".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Directory holding one JSON file per post
    pub posts_path: PathBuf,
    /// Directory uploaded images are written to
    pub uploads_path: PathBuf,
    /// Public URL prefix the uploads directory is served under
    #[serde(default = "default_uploads_url_prefix")]
    pub uploads_url_prefix: String,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded paths
        config.posts_path = Self::expand_path(&config.posts_path).unwrap_or(config.posts_path);
        config.uploads_path =
            Self::expand_path(&config.uploads_path).unwrap_or(config.uploads_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/folio");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        shellexpand::full(&path_str)
            .ok()
            .map(|expanded| PathBuf::from(expanded.as_ref()))
    }
}
