use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use shiftsync::api::HttpApiConfig;
use shiftsync::names::DEFAULT_MAX_CONCURRENT_LOOKUPS;
use shiftsync::notify::DEFAULT_MAX_CONCURRENT_SENDS;
use shiftsync::session::{DEFAULT_TOKEN_ENV, Session};
use shiftsync::view::ViewConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub names: NamesConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let http = HttpApiConfig::default();
        Self {
            base_url: http.base_url,
            timeout_ms: http.timeout.as_millis() as u64,
        }
    }
}

/// Where the bearer credential comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub token_env: String,
    pub token_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            token_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamesConfig {
    pub max_concurrent_lookups: usize,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub max_concurrent_sends: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sends: DEFAULT_MAX_CONCURRENT_SENDS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            names: NamesConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            eyre::bail!("api.base_url must not be empty");
        }
        if self.api.timeout_ms == 0 {
            eyre::bail!("api.timeout_ms must be > 0");
        }
        if self.names.max_concurrent_lookups == 0 {
            eyre::bail!("names.max_concurrent_lookups must be > 0");
        }
        if self.notify.max_concurrent_sends == 0 {
            eyre::bail!("notify.max_concurrent_sends must be > 0");
        }
        Ok(())
    }

    pub fn http(&self) -> HttpApiConfig {
        HttpApiConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_millis(self.api.timeout_ms),
        }
    }

    pub fn view(&self) -> ViewConfig {
        ViewConfig {
            max_concurrent_lookups: self.names.max_concurrent_lookups,
            max_concurrent_sends: self.notify.max_concurrent_sends,
        }
    }

    /// Credential from the configured env var, then the token file
    pub fn session(&self) -> Result<Session> {
        Session::discover(&self.session.token_env, self.session.token_file.as_deref())
            .context("Failed to read session credential")
    }
}
