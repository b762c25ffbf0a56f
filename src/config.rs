//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Shortest pause between scheduled runs.
pub const MIN_INTERVAL_SECS: u64 = 10;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listing page every run starts from
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Seconds between scheduled runs
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Page ceiling for the crawl strategy
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// User agent sent by the fetcher and the browser
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Chat webhook receiving reports
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Whether a headless browser may be used
    #[serde(default = "default_browser")]
    pub browser: bool,

    /// Round ceiling for dynamic expansion
    #[serde(default = "default_max_expand_rounds")]
    pub max_expand_rounds: u32,

    /// Wall-clock budget for dynamic expansion in milliseconds
    #[serde(default = "default_expand_budget_ms")]
    pub expand_budget_ms: u64,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between crawled pages in milliseconds
    #[serde(default)]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default)]
    pub delay_jitter_ms: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_start_url() -> String {
    "https://www.sportsexperts.ca/en-CA/search?keywords=arc%27teryx".to_string()
}

fn default_timeout_secs() -> u64 {
    12
}

fn default_interval_secs() -> u64 {
    1800
}

fn default_max_pages() -> usize {
    5
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124 Safari/537.36"
        .to_string()
}

fn default_browser() -> bool {
    true
}

fn default_max_expand_rounds() -> u32 {
    30
}

fn default_expand_budget_ms() -> u64 {
    60_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
            max_pages: default_max_pages(),
            user_agent: default_user_agent(),
            webhook_url: None,
            browser: default_browser(),
            max_expand_rounds: default_max_expand_rounds(),
            expand_budget_ms: default_expand_budget_ms(),
            proxy: None,
            delay_ms: 0,
            delay_jitter_ms: 0,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("sale-scout").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides. Unparsable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Some(url) = env_string("START_URL") {
            self.start_url = url;
        }

        if let Some(timeout) = env_parsed("TIMEOUT") {
            self.timeout_secs = timeout;
        }

        if let Some(interval) = env_parsed("INTERVAL_SEC") {
            self.interval_secs = interval;
        }

        if let Some(pages) = env_parsed("MAX_PAGES") {
            self.max_pages = pages;
        }

        if let Some(ua) = env_string("USER_AGENT") {
            self.user_agent = ua;
        }

        if let Some(webhook) = env_string("DISCORD_WEBHOOK_URL") {
            self.webhook_url = Some(webhook);
        }

        if std::env::var("DISABLE_BROWSER").is_ok_and(|v| v.trim() == "1") {
            self.browser = false;
        }

        if let Some(rounds) = env_parsed("MAX_SHOW_MORE") {
            self.max_expand_rounds = rounds;
        }

        if let Some(budget) = env_parsed("EXPAND_BUDGET_MS") {
            self.expand_budget_ms = budget;
        }

        if let Some(proxy) = env_string("SCOUT_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Some(delay) = env_parsed("SCOUT_DELAY") {
            self.delay_ms = delay;
        }

        self
    }

    /// Pause between scheduled runs, never shorter than [`MIN_INTERVAL_SECS`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(MIN_INTERVAL_SECS))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key)?.parse().ok()
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: text, json, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Sets env vars for the duration of `f`, restoring the originals afterwards.
    fn with_vars(vars: &[(&str, &str)], f: impl FnOnce()) {
        let originals: Vec<_> = vars.iter().map(|(k, _)| (*k, std::env::var(k).ok())).collect();
        for (k, v) in vars {
            std::env::set_var(k, v);
        }

        f();

        for (k, orig) in originals {
            match orig {
                Some(v) => std::env::set_var(k, v),
                None => std::env::remove_var(k),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.start_url.starts_with("https://www.sportsexperts.ca/"));
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.interval_secs, 1800);
        assert_eq!(config.max_pages, 5);
        assert!(config.user_agent.contains("Chrome/124"));
        assert!(config.webhook_url.is_none());
        assert!(config.browser);
        assert_eq!(config.max_expand_rounds, 30);
        assert_eq!(config.expand_budget_ms, 60_000);
        assert!(config.proxy.is_none());
        assert_eq!(config.delay_ms, 0);
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn test_interval_floor() {
        let config = Config { interval_secs: 3, ..Config::default() };
        assert_eq!(config.interval(), Duration::from_secs(10));

        let config = Config { interval_secs: 600, ..Config::default() };
        assert_eq!(config.interval(), Duration::from_secs(600));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "table".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
        assert!(err.contains("text, json, csv"));
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Text.to_string(), "text");
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_output_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Csv).unwrap();
        assert_eq!(json, "\"csv\"");

        let parsed: OutputFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(parsed, OutputFormat::Json);
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            start_url = "https://shop.test/sale"
            interval_secs = 900
            browser = false
            webhook_url = "https://discord.test/api/webhooks/1/abc"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.start_url, "https://shop.test/sale");
        assert_eq!(config.interval_secs, 900);
        assert!(!config.browser);
        assert_eq!(config.webhook_url.as_deref(), Some("https://discord.test/api/webhooks/1/abc"));
        assert_eq!(config.max_pages, 5);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            max_pages = 9
            format = "json"
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.max_pages, 9);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 30").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_with_env() {
        with_vars(
            &[
                ("START_URL", "https://shop.test/deals"),
                ("INTERVAL_SEC", "120"),
                ("DISABLE_BROWSER", "1"),
                ("MAX_SHOW_MORE", "4"),
                ("SCOUT_PROXY", "http://proxy:8080"),
            ],
            || {
                let config = Config::new().with_env();
                assert_eq!(config.start_url, "https://shop.test/deals");
                assert_eq!(config.interval_secs, 120);
                assert!(!config.browser);
                assert_eq!(config.max_expand_rounds, 4);
                assert_eq!(config.proxy.as_deref(), Some("http://proxy:8080"));
            },
        );
    }

    #[test]
    fn test_config_with_env_invalid_values() {
        with_vars(
            &[("TIMEOUT", "soon"), ("MAX_PAGES", "-1"), ("EXPAND_BUDGET_MS", "")],
            || {
                let config = Config::new().with_env();
                assert_eq!(config.timeout_secs, 12);
                assert_eq!(config.max_pages, 5);
                assert_eq!(config.expand_budget_ms, 60_000);
            },
        );
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            webhook_url: Some("https://discord.test/hook".to_string()),
            delay_ms: 250,
            format: OutputFormat::Csv,
            ..Config::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.webhook_url, config.webhook_url);
        assert_eq!(parsed.delay_ms, config.delay_ms);
        assert_eq!(parsed.format, config.format);
        assert_eq!(parsed.start_url, config.start_url);
    }
}
