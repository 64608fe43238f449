//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Transport timeout used when nothing else is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "HUDDLE_BASE_URL";

/// Environment variable holding a bearer token
pub const TOKEN_ENV: &str = "HUDDLE_TOKEN";

/// Configuration for huddle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub base_url: Option<String>,
    /// Meeting template sent with every request
    pub template_id: Option<String>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Transport timeout for one exchange
    pub request_timeout_secs: Option<u64>,
    /// Bearer token (prefer `--login` or the environment)
    pub token: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("huddle")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("HUDDLE_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default path. Problems are reported and the
    /// defaults used.
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {e}");
                Self::default()
            }
        }
    }

    /// Load config from `path`; a missing file is an empty config
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {e}", path.display()))?;
        let config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            template_id: None,
            tui: Some(true),
            request_timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            token: None,
        };

        default_config.save_to(&path)?;
        Ok(path)
    }
}

/// Overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub template_id: Option<String>,
    pub no_tui: bool,
}

/// Effective settings after merging all sources
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub template_id: Option<String>,
    pub use_tui: bool,
    pub request_timeout: Duration,
}

impl Settings {
    /// Merge sources: command line, then environment, then config file,
    /// then defaults
    pub fn resolve(
        cli: CliOverrides,
        env: impl Fn(&str) -> Option<String>,
        config: &Config,
    ) -> Self {
        let base_url = cli
            .base_url
            .or_else(|| env(BASE_URL_ENV).filter(|v| !v.trim().is_empty()))
            .or_else(|| config.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let template_id = cli
            .template_id
            .or_else(|| config.template_id.clone())
            .filter(|t| !t.trim().is_empty());

        let timeout_secs = config
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            base_url,
            template_id,
            use_tui: !cli.no_tui && config.tui.unwrap_or(true),
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# huddle configuration file
# Place at ~/.config/huddle/config.toml (Linux) or set HUDDLE_CONFIG_PATH

# Backend base URL (HUDDLE_BASE_URL overrides)
base_url = "http://localhost:8000"

# Meeting template sent with every request (optional)
# template_id = "weekly-sync"

# Whether to use TUI mode by default (true by default)
# Set to false for simple stdin/stdout mode
tui = true

# Transport timeout in seconds for one exchange
request_timeout_secs = 60

# Bearer token (optional). Prefer `huddle --login <token>` or HUDDLE_TOKEN.
# token = "..."
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(config.tui, Some(true));
        assert_eq!(config.request_timeout_secs, Some(60));
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            base_url: Some("https://meet.example.com".into()),
            template_id: Some("retro".into()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "base_url = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(CliOverrides::default(), no_env, &Config::default());
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.template_id, None);
        assert!(settings.use_tui);
        assert_eq!(settings.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_precedence() {
        let config = Config {
            base_url: Some("http://file".into()),
            template_id: Some("file-template".into()),
            tui: Some(true),
            ..Default::default()
        };
        let env = |key: &str| (key == BASE_URL_ENV).then(|| "http://env".to_string());

        let from_env = Settings::resolve(CliOverrides::default(), env, &config);
        assert_eq!(from_env.base_url, "http://env");
        assert_eq!(from_env.template_id.as_deref(), Some("file-template"));

        let cli = CliOverrides {
            base_url: Some("http://cli".into()),
            template_id: Some("cli-template".into()),
            no_tui: true,
        };
        let from_cli = Settings::resolve(cli, env, &config);
        assert_eq!(from_cli.base_url, "http://cli");
        assert_eq!(from_cli.template_id.as_deref(), Some("cli-template"));
        assert!(!from_cli.use_tui);

        let from_file = Settings::resolve(CliOverrides::default(), no_env, &config);
        assert_eq!(from_file.base_url, "http://file");
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        let settings = Settings::resolve(CliOverrides::default(), no_env, &config);
        assert_eq!(settings.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
