use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub page_size: u32,
    pub debounce_ms: u64,
    pub token_env: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 10,
            debounce_ms: 300,
            token_env: Some("ROUTEFINDER_TOKEN".to_string()),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("routefinder").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match toml::from_str::<Config>(&content) {
            Ok(config) => config.normalized(),
            Err(_) => Config::default(),
        }
    }

    fn normalized(mut self) -> Self {
        if self.page_size == 0 {
            self.page_size = Config::default().page_size;
        }
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
base_url = "https://routes.example.com"
page_size = 25
debounce_ms = 150
token_env = "MY_TOKEN"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.base_url, "https://routes.example.com");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.token_env.as_deref(), Some("MY_TOKEN"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config = toml::from_str(r#"page_size = 5"#).unwrap();
        assert_eq!(config.page_size, 5);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.debounce_ms, 300);
    }

    #[test]
    fn zero_page_size_is_normalized() {
        let config: Config = toml::from_str(r#"page_size = 0"#).unwrap();
        assert_eq!(config.normalized().page_size, 10);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.token_env.as_deref(), Some("ROUTEFINDER_TOKEN"));
    }
}
