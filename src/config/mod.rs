//! Configuration: loader, HTTP retrieval and page settings, readable from
//! YAML, JSON or TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::HttpFetchConfig;

/// Attribute that marks an inclusion point.
pub const DEFAULT_INCLUDE_ATTRIBUTE: &str = "data-include";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (`.yaml` / `.yml`).
    Yaml,
    /// JSON format (`.json`).
    Json,
    /// TOML format (`.toml`).
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Fragment loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Attribute that marks an inclusion point
    pub attribute: String,
    /// Re-execute scripts found in fragments
    pub execute_scripts: bool,
    /// Per-retrieval timeout; unset means wait forever
    pub fetch_timeout_ms: Option<u64>,
    /// Cap on simultaneous retrievals; unset means unbounded fan-out
    pub max_concurrency: Option<usize>,
    /// Inline style of the failure marker
    pub failure_marker_style: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            attribute: DEFAULT_INCLUDE_ATTRIBUTE.to_string(),
            execute_scripts: true,
            fetch_timeout_ms: None,
            max_concurrency: None,
            failure_marker_style: "color:red;".to_string(),
        }
    }
}

impl LoaderConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// `max_concurrency` with zero treated as unbounded.
    pub fn concurrency_limit(&self) -> Option<usize> {
        self.max_concurrency.filter(|n| *n > 0)
    }
}

/// Page behavior settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub clock: bool,
    pub theme: bool,
    pub lazy_images: bool,
    pub reveal_animations: bool,
    /// Clock zone as a fixed UTC offset (WIB is +7)
    pub utc_offset_hours: i32,
    /// JSON file backing persistent storage; in-memory when unset
    pub storage_path: Option<PathBuf>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            clock: true,
            theme: true,
            lazy_images: true,
            reveal_animations: true,
            utc_offset_hours: 7,
            storage_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub loader: LoaderConfig,
    pub http: HttpFetchConfig,
    pub page: PageConfig,
}

/// Parse config content in the given format.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<AppConfig, ConfigError> {
    match format {
        ConfigFormat::Yaml => {
            serde_saphyr::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string())),
    }
}

/// Read and parse a config file, picking the format from its extension.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_config(&content, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_preserve_unbounded_behavior() {
        let config = AppConfig::default();
        assert_eq!(config.loader.attribute, "data-include");
        assert!(config.loader.execute_scripts);
        assert_eq!(config.loader.fetch_timeout(), None);
        assert_eq!(config.loader.concurrency_limit(), None);
        assert_eq!(config.page.utc_offset_hours, 7);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
loader:
  fetch_timeout_ms: 1500
  max_concurrency: 4
page:
  clock: false
"#;
        let config = parse_config(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.loader.fetch_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.loader.concurrency_limit(), Some(4));
        assert_eq!(config.loader.attribute, "data-include");
        assert!(!config.page.clock);
        assert!(config.page.theme);
    }

    #[test]
    fn test_parse_json_and_toml() {
        let json = r#"{"loader": {"attribute": "data-partial"}}"#;
        let config = parse_config(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.loader.attribute, "data-partial");

        let toml_src = "[loader]\nexecute_scripts = false\n[http]\nhttp2_enabled = false\n";
        let config = parse_config(toml_src, ConfigFormat::Toml).unwrap();
        assert!(!config.loader.execute_scripts);
        assert!(!config.http.http2_enabled);
    }

    #[test]
    fn test_zero_concurrency_means_unbounded() {
        let config = LoaderConfig {
            max_concurrency: Some(0),
            ..Default::default()
        };
        assert_eq!(config.concurrency_limit(), None);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/site.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert!(ConfigFormat::from_path(Path::new("site.ini")).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xinclude.json");
        std::fs::write(&path, r#"{"page": {"storage_path": "state.json"}}"#).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.page.storage_path, Some(PathBuf::from("state.json")));

        let missing = load_config(&dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
