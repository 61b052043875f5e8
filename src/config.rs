//! Configuration for dealboard, read from `dealboard.toml`.
//!
//! Settings are layered: file, then environment, then CLI flags.
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8000/api"
//! token = "..."
//! page_size = 500
//! timeout_secs = 15
//!
//! [gesture]
//! activation_distance = 5.0
//!
//! [server]
//! port = 3142
//! dev = false
//!
//! [logging]
//! format = "fmt"
//! log_dir = ".dealboard/logs"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::board::{BoardOptions, DEFAULT_PAGE_SIZE, gesture::DEFAULT_ACTIVATION_DISTANCE};
use crate::client::{HttpDealApi, Session};

pub const CONFIG_FILE: &str = "dealboard.toml";

pub const ENV_API_URL: &str = "DEALBOARD_API_URL";
pub const ENV_API_TOKEN: &str = "DEALBOARD_API_TOKEN";
pub const ENV_PAGE_SIZE: &str = "DEALBOARD_PAGE_SIZE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureSection {
    /// Pixels the pointer must travel before a press becomes a drag.
    #[serde(default = "default_activation_distance")]
    pub activation_distance: f64,
}

fn default_activation_distance() -> f64 {
    DEFAULT_ACTIVATION_DISTANCE
}

impl Default for GestureSection {
    fn default() -> Self {
        Self {
            activation_distance: default_activation_distance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind on all interfaces and allow any origin.
    #[serde(default)]
    pub dev: bool,
}

fn default_port() -> u16 {
    3142
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            dev: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Fmt,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Fmt => "fmt",
            LogFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fmt" | "text" => Ok(LogFormat::Fmt),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Valid values: fmt, json", s)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub format: LogFormat,
    /// Also write a daily rolling log file here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

/// The complete dealboard.toml configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DealboardToml {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub gesture: GestureSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl DealboardToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse dealboard.toml")
    }

    /// Defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize dealboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `DEALBOARD_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.api.token = Some(token);
        }
        if let Some(size) = lookup(ENV_PAGE_SIZE).and_then(|v| v.trim().parse().ok()) {
            self.api.page_size = size;
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.api.base_url.trim().is_empty() {
            warnings.push("api.base_url is empty; no backend to talk to".to_string());
        } else if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            warnings.push(format!(
                "api.base_url '{}' should start with http:// or https://",
                self.api.base_url
            ));
        }
        if self.api.page_size == 0 {
            warnings.push("api.page_size is 0; the board would always be empty".to_string());
        }
        if self.api.timeout_secs == 0 {
            warnings.push("api.timeout_secs is 0; every request would time out".to_string());
        }
        let distance = self.gesture.activation_distance;
        if distance.is_nan() || distance <= 0.0 {
            warnings.push(format!(
                "gesture.activation_distance should be positive, got {}",
                distance
            ));
        }
        if self.api.token.is_none() {
            warnings.push(format!(
                "No API token configured (set api.token or {})",
                ENV_API_TOKEN
            ));
        }

        warnings
    }
}

/// Where the config file lives: an explicit path, `./dealboard.toml` if
/// present, otherwise the user config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(CONFIG_FILE);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("dealboard").join(CONFIG_FILE))
        .unwrap_or(local)
}

/// Effective settings after merging file, environment and CLI.
#[derive(Debug, Clone)]
pub struct DealboardConfig {
    pub path: PathBuf,
    pub toml: DealboardToml,
    pub verbose: bool,
}

impl DealboardConfig {
    pub fn load(explicit: Option<&Path>, api_url: Option<String>, verbose: bool) -> Result<Self> {
        let path = resolve_config_path(explicit);
        let mut toml = DealboardToml::load_or_default(&path)?;
        toml.apply_env();
        if let Some(url) = api_url {
            toml.api.base_url = url;
        }
        Ok(Self { path, toml, verbose })
    }

    pub fn session(&self) -> Session {
        match &self.toml.api.token {
            Some(token) => Session::with_token(token.clone()),
            None => Session::anonymous(),
        }
    }

    pub fn http_api(&self) -> Result<HttpDealApi> {
        HttpDealApi::new(
            &self.toml.api.base_url,
            self.session(),
            Duration::from_secs(self.toml.api.timeout_secs),
        )
        .with_context(|| format!("Invalid API base URL: {}", self.toml.api.base_url))
    }

    pub fn board_options(&self) -> BoardOptions {
        BoardOptions {
            page_size: self.toml.api.page_size,
            activation_distance: self.toml.gesture.activation_distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = DealboardToml::parse("").unwrap();
        assert_eq!(toml.api.base_url, "http://localhost:8000/api");
        assert_eq!(toml.api.page_size, 500);
        assert_eq!(toml.api.timeout_secs, 15);
        assert_eq!(toml.gesture.activation_distance, 5.0);
        assert_eq!(toml.server.port, 3142);
        assert!(!toml.server.dev);
        assert_eq!(toml.logging.format, LogFormat::Fmt);
        assert!(toml.logging.log_dir.is_none());
    }

    #[test]
    fn test_parse_full() {
        let content = r#"
[api]
base_url = "https://crm.example.com/api"
token = "secret"
page_size = 200
timeout_secs = 30

[gesture]
activation_distance = 8.5

[server]
port = 9000
dev = true

[logging]
format = "json"
log_dir = "/var/log/dealboard"
"#;
        let toml = DealboardToml::parse(content).unwrap();
        assert_eq!(toml.api.base_url, "https://crm.example.com/api");
        assert_eq!(toml.api.token.as_deref(), Some("secret"));
        assert_eq!(toml.api.page_size, 200);
        assert_eq!(toml.gesture.activation_distance, 8.5);
        assert_eq!(toml.server.port, 9000);
        assert!(toml.server.dev);
        assert_eq!(toml.logging.format, LogFormat::Json);
        assert_eq!(toml.logging.log_dir, Some(PathBuf::from("/var/log/dealboard")));
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(DealboardToml::parse("[api\nbase_url = ").is_err());
        assert!(DealboardToml::parse("[logging]\nformat = \"xml\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, "https://env.example.com/api"),
            (ENV_API_TOKEN, "env-token"),
            (ENV_PAGE_SIZE, "50"),
        ]);
        let mut toml = DealboardToml::default();
        toml.apply_env_with(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(toml.api.base_url, "https://env.example.com/api");
        assert_eq!(toml.api.token.as_deref(), Some("env-token"));
        assert_eq!(toml.api.page_size, 50);
    }

    #[test]
    fn test_env_ignores_blank_and_garbage() {
        let mut toml = DealboardToml::default();
        toml.apply_env_with(|key| match key {
            ENV_API_URL => Some("  ".to_string()),
            ENV_PAGE_SIZE => Some("lots".to_string()),
            _ => None,
        });
        assert_eq!(toml.api.base_url, "http://localhost:8000/api");
        assert_eq!(toml.api.page_size, 500);
    }

    #[test]
    fn test_validate_warnings() {
        let mut toml = DealboardToml::default();
        toml.api.base_url = "crm.local".into();
        toml.api.page_size = 0;
        toml.gesture.activation_distance = 0.0;
        let warnings = toml.validate();
        assert!(warnings.iter().any(|w| w.contains("http://")));
        assert!(warnings.iter().any(|w| w.contains("page_size")));
        assert!(warnings.iter().any(|w| w.contains("activation_distance")));
        assert!(warnings.iter().any(|w| w.contains(ENV_API_TOKEN)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut toml = DealboardToml::default();
        toml.server.port = 4000;
        toml.logging.format = LogFormat::Json;
        toml.save(&path).unwrap();

        let loaded = DealboardToml::load(&path).unwrap();
        assert_eq!(loaded.server.port, 4000);
        assert_eq!(loaded.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let toml = DealboardToml::load_or_default(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(toml.server.port, 3142);
    }

    #[test]
    fn test_resolve_explicit_path_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_cli_url_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[api]\nbase_url = \"http://file.local/api\"\ntoken = \"t\"\n").unwrap();
        let config =
            DealboardConfig::load(Some(&path), Some("http://cli.local/api".into()), false).unwrap();
        assert_eq!(config.toml.api.base_url, "http://cli.local/api");
        assert_eq!(config.session().token(), Some("t"));
        assert_eq!(config.board_options().page_size, 500);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("text").unwrap(), LogFormat::Fmt);
        assert!(LogFormat::from_str("xml").is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
