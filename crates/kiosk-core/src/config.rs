use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Environment variables checked for the credential, in order.
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GOOGLE_API_KEY"];

pub const MISSING_KEY_BANNER: &str =
    "GOOGLE_API_KEY is not set. Please configure your environment secrets.";

/// Optional settings file. The credential never lives here.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub media_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        match Self::get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Command-line values win over the file.
    pub fn with_overrides(
        mut self,
        model: Option<String>,
        api_base: Option<String>,
        media_dir: Option<PathBuf>,
    ) -> Self {
        if model.is_some() {
            self.model = model;
        }
        if api_base.is_some() {
            self.api_base = api_base;
        }
        if media_dir.is_some() {
            self.media_dir = media_dir;
        }
        self
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    /// Where the file picker opens.
    pub fn media_dir(&self) -> PathBuf {
        self.media_dir
            .clone()
            .or_else(dirs::picture_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gemini-kiosk").join("config.json"))
    }
}

/// Read the credential from the process environment.
pub fn api_key_from_env() -> Option<String> {
    api_key_from(|name| std::env::var(name).ok())
}

pub fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn test_file_values_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "model": "gemini-2.5-pro", "media_dir": "/srv/media" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model(), "gemini-2.5-pro");
        assert_eq!(config.media_dir(), PathBuf::from("/srv/media"));

        let config = config.with_overrides(Some("gemini-2.0-flash".to_string()), None, None);
        assert_eq!(config.model(), "gemini-2.0-flash");
        assert_eq!(config.media_dir(), PathBuf::from("/srv/media"));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ model: ").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_api_key_lookup_order() {
        let key = api_key_from(|name| match name {
            "API_KEY" => Some("primary".to_string()),
            "GOOGLE_API_KEY" => Some("fallback".to_string()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("primary"));

        let key = api_key_from(|name| match name {
            "API_KEY" => Some("   ".to_string()),
            "GOOGLE_API_KEY" => Some("fallback".to_string()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("fallback"));

        assert_eq!(api_key_from(|_| None), None);
    }
}
