use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

const APP_DIR: &str = "mindsync";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub connect_timeout_secs: u64,
    pub session_path: PathBuf,
    pub log_file: PathBuf,
}

// Everything in the file is optional and layered over the defaults.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_base_url: Option<String>,
    connect_timeout_secs: Option<u64>,
    session_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Config {
            api_base_url: DEFAULT_API_URL.to_string(),
            connect_timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_path: data_dir.join("session.json"),
            log_file: data_dir.join("mindsync.log"),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Defaults, then the config file, then `MINDSYNC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();
        let path = path.map(Path::to_path_buf).or_else(Config::default_path);
        if let Some(path) = path {
            if path.exists() {
                let raw = fs::read_to_string(&path)?;
                config.merge_toml(&raw)?;
                log::debug!("loaded config from {}", path.display());
            }
        }
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config.normalized())
    }

    pub fn merge_toml(&mut self, raw: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(raw)?;
        if let Some(url) = file.api_base_url {
            self.api_base_url = url;
        }
        if let Some(secs) = file.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if let Some(path) = file.session_path {
            self.session_path = path;
        }
        if let Some(path) = file.log_file {
            self.log_file = path;
        }
        Ok(())
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MINDSYNC_API_URL") {
            self.api_base_url = url;
        }
        if let Some(secs) = lookup("MINDSYNC_TIMEOUT_SECS") {
            self.connect_timeout_secs = secs.trim().parse().map_err(|_| {
                Error::Config(format!("MINDSYNC_TIMEOUT_SECS is not a number: '{}'", secs))
            })?;
        }
        if let Some(path) = lookup("MINDSYNC_SESSION_FILE") {
            self.session_path = PathBuf::from(path);
        }
        Ok(())
    }

    fn normalized(mut self) -> Self {
        let trimmed = self.api_base_url.trim().trim_end_matches('/').to_string();
        self.api_base_url = trimmed;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
