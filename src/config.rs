use crate::error::{BackstageError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The base config directory name under ~/.config/
const CONFIG_DIR_NAME: &str = "backstage";

/// The filename of the configuration file.
const CONFIG_FILENAME: &str = "config.toml";

/// The filename of the console log file.
const LOG_FILENAME: &str = "console.log";

/// Environment variable overriding `api_base_url`.
pub const ENV_API_URL: &str = "BACKSTAGE_API_URL";

/// Environment variable overriding `token`.
pub const ENV_TOKEN: &str = "BACKSTAGE_TOKEN";

// ============================================================================
// Console Configuration
// ============================================================================

/// Connection and session settings for the console.
///
/// Missing fields in a config file take their default values, so a partial
/// file works.
///
/// # Example
///
/// ```toml
/// api_base_url = "http://127.0.0.1:8080/api"
/// token = ""
/// page_size = 20
/// permissions = ["/dashboard", "/content/article/index"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL every API path is appended to.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token sent with every request. Empty means no header.
    #[serde(default)]
    pub token: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default page size for list pages.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// How long a tab refresh stays on the loading route, in milliseconds.
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,

    /// Route activated when the last tab closes.
    #[serde(default = "default_home_route")]
    pub home_route: String,

    /// Permission strings granted to this session.
    #[serde(default)]
    pub permissions: Vec<String>,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> u32 {
    20
}

fn default_refresh_delay_ms() -> u64 {
    1000
}

fn default_home_route() -> String {
    crate::menu::DASHBOARD_ROUTE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            refresh_delay_ms: default_refresh_delay_ms(),
            home_route: default_home_route(),
            permissions: Vec::new(),
        }
    }
}

impl Config {
    pub fn token(&self) -> Option<String> {
        let token = self.token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.refresh_delay_ms)
    }

    /// Apply environment overrides using `lookup` (normally `std::env::var`).
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = token;
        }
        self
    }
}

// ============================================================================
// Config Validation
// ============================================================================

use std::error::Error;
use std::fmt;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `api_base_url` is not an absolute http(s) URL.
    InvalidApiUrl(String),
    /// `page_size` is zero.
    ZeroPageSize,
    /// `timeout_secs` is zero.
    ZeroTimeout,
    /// `home_route` does not start with `/`.
    InvalidHomeRoute(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidApiUrl(url) => write!(
                f,
                "Invalid api_base_url `{}`. Expected an absolute http:// or https:// URL",
                url
            ),
            ConfigError::ZeroPageSize => write!(f, "page_size must be greater than 0"),
            ConfigError::ZeroTimeout => write!(f, "timeout_secs must be greater than 0"),
            ConfigError::InvalidHomeRoute(route) => {
                write!(f, "home_route `{}` must start with `/`", route)
            }
        }
    }
}

impl Error for ConfigError {}

/// Validate a configuration for logical consistency.
///
/// # Example
///
/// ```
/// use backstage::config::{Config, validate_config};
///
/// assert!(validate_config(&Config::default()).is_ok());
///
/// let invalid = Config {
///     page_size: 0,
///     ..Default::default()
/// };
/// assert!(validate_config(&invalid).is_err());
/// ```
pub fn validate_config(config: &Config) -> std::result::Result<(), ConfigError> {
    match url::Url::parse(&config.api_base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => return Err(ConfigError::InvalidApiUrl(config.api_base_url.clone())),
    }
    if config.page_size == 0 {
        return Err(ConfigError::ZeroPageSize);
    }
    if config.timeout_secs == 0 {
        return Err(ConfigError::ZeroTimeout);
    }
    if !config.home_route.starts_with('/') {
        return Err(ConfigError::InvalidHomeRoute(config.home_route.clone()));
    }
    Ok(())
}

// ============================================================================
// Config File Management
// ============================================================================

/// Get the backstage config directory path (~/.config/backstage/).
///
/// Returns the path to the config directory. Does not create the directory.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BackstageError::Config("Could not determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR_NAME))
}

/// Ensure the config directory exists. Returns whether it was newly created.
pub fn ensure_config_dir() -> Result<(PathBuf, bool)> {
    ensure_dir_at(&config_dir()?)
}

fn ensure_dir_at(dir: &Path) -> Result<(PathBuf, bool)> {
    let created = !dir.exists();
    fs::create_dir_all(dir)?;
    Ok((dir.to_path_buf(), created))
}

/// Path to `~/.config/backstage/config.toml`.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILENAME))
}

/// Path to the console log file.
pub fn log_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(LOG_FILENAME))
}

/// Load `~/.config/backstage/config.toml`, creating it with commented
/// defaults when missing.
pub fn load_config() -> Result<Config> {
    load_config_at(&config_path()?)
}

/// Load the config file at `path`, creating it when missing.
pub fn load_config_at(path: &Path) -> Result<Config> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            ensure_dir_at(parent)?;
        }
        fs::write(path, generate_config_with_comments(&Config::default()))?;
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| {
        BackstageError::Config(format!("Failed to parse config file at {:?}: {}", path, e))
    })
}

/// Save `config` to `~/.config/backstage/config.toml`, overwriting any
/// user-added comments.
pub fn save_config(config: &Config) -> Result<()> {
    save_config_at(config, &config_path()?)
}

pub fn save_config_at(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir_at(parent)?;
    }
    fs::write(path, generate_config_with_comments(config))?;
    Ok(())
}

/// Loaded config with environment overrides applied and validated.
pub fn effective_config() -> Result<Config> {
    let config = load_config()?.with_env_overrides(|key| std::env::var(key).ok());
    validate_config(&config).map_err(|e| BackstageError::Config(e.to_string()))?;
    Ok(config)
}

/// Keys accepted by [`set_config_value`].
pub const VALID_KEYS: &[&str] = &[
    "api_base_url",
    "token",
    "timeout_secs",
    "page_size",
    "refresh_delay_ms",
    "home_route",
    "permissions",
];

/// Set `key` from its string form. `permissions` takes a comma-separated list.
pub fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
        value.trim().parse().map_err(|_| {
            BackstageError::Config(format!("`{}` expects a number, got `{}`", key, value))
        })
    }

    match key {
        "api_base_url" => config.api_base_url = value.trim().to_string(),
        "token" => config.token = value.to_string(),
        "timeout_secs" => config.timeout_secs = number(key, value)?,
        "page_size" => config.page_size = number(key, value)?,
        "refresh_delay_ms" => config.refresh_delay_ms = number(key, value)?,
        "home_route" => config.home_route = value.trim().to_string(),
        "permissions" => {
            config.permissions = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        }
        other => {
            return Err(BackstageError::Config(format!(
                "Unknown config key `{}`. Valid keys: {}",
                other,
                VALID_KEYS.join(", ")
            )))
        }
    }
    validate_config(config).map_err(|e| BackstageError::Config(e.to_string()))
}

/// Generate config file content with explanatory comments.
fn generate_config_with_comments(config: &Config) -> String {
    let permissions = config
        .permissions
        .iter()
        .map(|p| format!("    {:?},", p))
        .collect::<Vec<_>>()
        .join("\n");
    let permissions = if permissions.is_empty() {
        "[]".to_string()
    } else {
        format!("[\n{}\n]", permissions)
    };

    format!(
        r#"# Backstage Configuration

# Base URL of the remote API. Overridden by ${env_url}.
api_base_url = {url:?}

# Bearer token sent with every request (empty: none). Overridden by ${env_token}.
token = {token:?}

# Per-request timeout in seconds.
timeout_secs = {timeout}

# Rows per page on list pages.
page_size = {page_size}

# How long a tab refresh shows the loading page, in milliseconds.
refresh_delay_ms = {refresh}

# Route opened when the last tab is closed.
home_route = {home:?}

# Permission strings granted to this session, e.g. "/content/article/index".
# Tabs are only opened once at least one permission is present.
permissions = {permissions}
"#,
        env_url = ENV_API_URL,
        env_token = ENV_TOKEN,
        url = config.api_base_url,
        token = config.token,
        timeout = config.timeout_secs,
        page_size = config.page_size,
        refresh = config.refresh_delay_ms,
        home = config.home_route,
        permissions = permissions,
    )
}
