use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::archive::DEFAULT_ARCHIVE_URL;
use crate::error::AnnofetchError;

pub const CONFIG_FILE_NAME: &str = "annofetch.json";
pub const ARCHIVE_URL_ENV: &str = "ANNOFETCH_ARCHIVE_URL";
pub const DEFAULT_OUTPUT_DIR: &str = "resources/ref";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub archive_url: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub mapping_dir: Option<String>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub archive_url: String,
    pub output_dir: Utf8PathBuf,
    pub mapping_dir: Option<Utf8PathBuf>,
    pub connect_timeout: Duration,
    pub user_agent: Option<String>,
    /// File the values came from, if any.
    pub source: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist. Otherwise `./annofetch.json`, then the
    /// user config directory, then built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, AnnofetchError> {
        let config_path = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::discover(),
        };

        let mut resolved = match &config_path {
            Some(config_path) => {
                let content = fs::read_to_string(config_path)
                    .map_err(|_| AnnofetchError::ConfigRead(config_path.clone()))?;
                let config: Config = serde_json::from_str(&content)
                    .map_err(|err| AnnofetchError::ConfigParse(err.to_string()))?;
                Self::resolve_config(config)
            }
            None => ResolvedConfig::default(),
        };
        resolved.source = config_path;

        if let Ok(url) = std::env::var(ARCHIVE_URL_ENV) {
            if !url.trim().is_empty() {
                resolved.archive_url = url.trim().to_string();
            }
        }
        Ok(resolved)
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        ResolvedConfig {
            archive_url: config
                .archive_url
                .unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string()),
            output_dir: Utf8PathBuf::from(
                config
                    .output_dir
                    .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            mapping_dir: config.mapping_dir.map(Utf8PathBuf::from),
            connect_timeout: Duration::from_secs(
                config
                    .connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            user_agent: config.user_agent,
            source: None,
        }
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }
        ProjectDirs::from("org", "annofetch", "annofetch")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let resolved = ConfigLoader::resolve_config(Config::default());
        assert_eq!(resolved.archive_url, DEFAULT_ARCHIVE_URL);
        assert_eq!(resolved.output_dir, Utf8PathBuf::from("resources/ref"));
        assert_eq!(resolved.mapping_dir, None);
        assert_eq!(resolved.connect_timeout, Duration::from_secs(30));
    }
}
