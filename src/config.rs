//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment < CLI
use crate::cli::Cli;
use anyhow::{ensure, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "WIKI_UPLOAD_";

/// Config file used when `--config` is not given: `./config.toml` if it
/// exists, otherwise the per-user config directory.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from("config.toml");
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|d| d.join("wiki-upload").join("config.toml"))
        .unwrap_or(local)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub username: String,
    /// Prompted for when empty.
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiSettings {
    /// Full URL of the wiki's `api.php`.
    pub url: String,
    /// Seconds to wait between uploads.
    pub delay: f64,
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            delay: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub upload_dir: PathBuf,
    pub done_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("upload"),
            done_dir: PathBuf::from("done"),
            log_file: PathBuf::from("logs.txt"),
        }
    }
}

/// Fully resolved application configuration after all layers merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub user: UserSettings,
    pub wiki: WikiSettings,
    pub paths: PathSettings,
}

impl AppConfig {
    /// Pause between uploads. Out-of-range values only reach here when
    /// `validate` was skipped; they fall back to no pause.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.wiki.delay).unwrap_or(Duration::ZERO)
    }

    /// Rejects settings the uploader cannot start with. The password is
    /// not checked here since it may still be prompted for.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.user.username.trim().is_empty(),
            "Invalid config: user.username must be set"
        );
        ensure!(
            self.wiki.url.starts_with("http://") || self.wiki.url.starts_with("https://"),
            "Invalid config: wiki.url must be an http(s) URL, got {:?}",
            self.wiki.url
        );
        ensure!(
            Duration::try_from_secs_f64(self.wiki.delay).is_ok(),
            "Invalid config: wiki.delay must be a non-negative number of seconds, got {}",
            self.wiki.delay
        );
        Ok(())
    }
}

/// Loads config from defaults, the given TOML file, and the environment.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    Ok(config)
}

/// Applies command-line overrides to a loaded config.
pub fn apply_overrides(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(delay) = cli.delay {
        config.wiki.delay = delay;
    }
    if let Some(dir) = &cli.upload_dir {
        config.paths.upload_dir = dir.clone();
    }
    if let Some(dir) = &cli.done_dir {
        config.paths.done_dir = dir.clone();
    }
    if let Some(file) = &cli.log_file {
        config.paths.log_file = file.clone();
    }
    config
}
