use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no credentials configured: set DOTRACK_TOKEN, or DOTRACK_EMAIL and DOTRACK_PASSWORD")]
    MissingCredentials,
}

/// Settings from `config.toml`, overridden by the environment.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            email: None,
            password: None,
            log_file: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Login { email: String, password: String },
}

impl Config {
    /// Reads the config file if there is one, then applies environment
    /// variables (including any loaded from `.env`).
    pub fn load() -> Result<Config, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "loading config file");
                Config::from_file(&path)?
            }
            _ => {
                debug!("no config file found, using defaults");
                Config::default()
            }
        };
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Empty variables count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DOTRACK_API_URL") {
            self.api_url = url;
        }
        if let Some(token) = get("DOTRACK_TOKEN") {
            self.token = Some(token);
        }
        if let Some(email) = get("DOTRACK_EMAIL") {
            self.email = Some(email);
        }
        if let Some(password) = get("DOTRACK_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(path) = get("DOTRACK_LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }
    }

    /// A token takes precedence over email and password.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if let Some(token) = &self.token {
            return Ok(Credentials::Token(token.clone()));
        }
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Ok(Credentials::Login {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("dotrack").join("dotrack.log"))
            .unwrap_or_else(|| PathBuf::from("dotrack.log"))
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dotrack").join("config.toml"))
}
