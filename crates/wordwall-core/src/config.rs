//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/wordwall/config.toml)
//! 3. Environment variables (WORDWALL_* prefix)
//!
//! Environment variables take precedence over config file values. A missing
//! item store URL or token is not an error: the display then runs from its
//! snapshot only, see `Config::feed_settings`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::feed::{FeedEndpoint, FeedSettings};
use crate::overlay::OverlayTimings;
use crate::wall::WallTimings;

/// Environment variable prefix
const ENV_PREFIX: &str = "WORDWALL";

/// Collection used when none is configured
pub const DEFAULT_COLLECTION: &str = "texts";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Item store base URL, e.g. https://cms.example.com
    #[serde(default)]
    pub url: Option<String>,

    /// Static access token for the item store
    #[serde(default)]
    pub token: Option<String>,

    /// Collection holding the wall's entries
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Debug log file for the display (defaults to the data dir)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Animation timing
    #[serde(default)]
    pub animation: AnimationConfig,
}

/// Animation timing in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub reveal_interval_ms: u64,
    pub decay_window_ms: u64,
    pub decay_tick_ms: u64,
    pub overlay_char_ms: u64,
    pub overlay_hold_ms: u64,
    pub overlay_exit_ms: u64,
    pub overlay_gap_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            reveal_interval_ms: 60,
            decay_window_ms: 400,
            decay_tick_ms: 16,
            overlay_char_ms: 40,
            overlay_hold_ms: 2000,
            overlay_exit_ms: 300,
            overlay_gap_ms: 100,
        }
    }
}

impl AnimationConfig {
    /// Engine timings for this configuration
    pub fn timings(&self) -> WallTimings {
        WallTimings {
            reveal_interval: Duration::from_millis(self.reveal_interval_ms.max(1)),
            decay_window: Duration::from_millis(self.decay_window_ms),
            decay_tick: Duration::from_millis(self.decay_tick_ms.max(1)),
            overlay: OverlayTimings {
                char_interval: Duration::from_millis(self.overlay_char_ms),
                hold: Duration::from_millis(self.overlay_hold_ms),
                exit: Duration::from_millis(self.overlay_exit_ms),
                gap: Duration::from_millis(self.overlay_gap_ms),
            },
            ..WallTimings::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            collection: default_collection(),
            log_file: None,
            animation: AnimationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (WORDWALL_URL, WORDWALL_TOKEN, WORDWALL_COLLECTION, WORDWALL_LOG_FILE)
    /// 2. Config file (~/.config/wordwall/config.toml or WORDWALL_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load from an explicit path if given, otherwise from the default location
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // WORDWALL_URL
        if let Ok(val) = std::env::var(format!("{}_URL", ENV_PREFIX)) {
            self.url = non_empty(val);
        }

        // WORDWALL_TOKEN
        if let Ok(val) = std::env::var(format!("{}_TOKEN", ENV_PREFIX)) {
            self.token = non_empty(val);
        }

        // WORDWALL_COLLECTION
        if let Ok(val) = std::env::var(format!("{}_COLLECTION", ENV_PREFIX)) {
            if !val.is_empty() {
                self.collection = val;
            }
        }

        // WORDWALL_LOG_FILE
        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = non_empty(val).map(PathBuf::from);
        }
    }

    /// Connection settings for the live feed and the REST client
    pub fn feed_settings(&self) -> FeedSettings {
        match (&self.url, &self.token) {
            (Some(url), Some(token)) => FeedSettings::Configured(FeedEndpoint {
                url: url.clone(),
                token: token.clone(),
            }),
            (None, _) => FeedSettings::Unconfigured { missing: "url" },
            (_, None) => FeedSettings::Unconfigured { missing: "token" },
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with WORDWALL_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordwall")
            .join("config.toml")
    }

    /// Log file path, falling back to the data directory
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| default_data_dir().join("debug.log"))
    }
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

/// Get the default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wordwall")
}

fn non_empty(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "WORDWALL_URL",
        "WORDWALL_TOKEN",
        "WORDWALL_COLLECTION",
        "WORDWALL_LOG_FILE",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.url.is_none());
        assert!(config.token.is_none());
        assert_eq!(config.collection, "texts");
        assert_eq!(config.animation, AnimationConfig::default());
    }

    #[test]
    fn test_default_timings_match_engine_defaults() {
        assert_eq!(AnimationConfig::default().timings(), WallTimings::default());
    }

    #[test]
    fn test_feed_settings_unconfigured() {
        let mut config = Config::default();
        assert!(matches!(
            config.feed_settings(),
            FeedSettings::Unconfigured { missing: "url" }
        ));

        config.url = Some("https://cms.example.com".to_string());
        assert!(matches!(
            config.feed_settings(),
            FeedSettings::Unconfigured { missing: "token" }
        ));

        config.token = Some("secret".to_string());
        match config.feed_settings() {
            FeedSettings::Configured(endpoint) => {
                assert_eq!(endpoint.url, "https://cms.example.com");
                assert_eq!(endpoint.token, "secret");
            }
            other => panic!("Expected configured settings, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("WORDWALL_URL", "https://cms.example.com");
        env::set_var("WORDWALL_TOKEN", "abc");
        env::set_var("WORDWALL_COLLECTION", "posts");
        config.apply_env_overrides();

        assert_eq!(config.url.as_deref(), Some("https://cms.example.com"));
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.collection, "posts");

        // Empty strings clear optional values but never the collection
        env::set_var("WORDWALL_URL", "");
        env::set_var("WORDWALL_COLLECTION", "");
        config.apply_env_overrides();
        assert!(config.url.is_none());
        assert_eq!(config.collection, "posts");
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            url = "https://cms.example.com"
            token = "abc"

            [animation]
            reveal_interval_ms = 30
            overlay_hold_ms = 500
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.collection, "texts");
        assert_eq!(config.animation.reveal_interval_ms, 30);
        assert_eq!(config.animation.decay_window_ms, 400);

        let timings = config.animation.timings();
        assert_eq!(timings.reveal_interval, Duration::from_millis(30));
        assert_eq!(timings.overlay.hold, Duration::from_millis(500));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/wordwall.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(config.url.is_none());
        assert_eq!(config.collection, "texts");
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            url: Some("https://cms.example.com".to_string()),
            token: Some("abc".to_string()),
            collection: "wall".to_string(),
            log_file: None,
            animation: AnimationConfig::default(),
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.url, config.url);
        assert_eq!(loaded.collection, "wall");
        assert_eq!(loaded.animation, config.animation);
    }
}
