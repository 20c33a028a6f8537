use ::config::{Environment, File};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_URL: &str = "https://status.duo.com/history";
pub const DEFAULT_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;
pub const DEFAULT_MAX_DIFF_LINES: usize = 40;
pub const DEFAULT_STATE_PATH: &str = "~/.cache/site-change-watcher/state.json";

pub const MIN_INTERVAL_SECONDS: u64 = 10;
pub const MIN_TIMEOUT_SECONDS: u64 = 1;
pub const MIN_DIFF_LINES: usize = 1;

/// Prefix of environment variables read as settings, e.g.
/// `SITE_WATCHER_INTERVAL_SECONDS=120`.
pub const ENV_PREFIX: &str = "SITE_WATCHER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("invalid {field} {value:?}: {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{field} must be an http or https URL, got {value:?}")]
    UnsupportedScheme { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Raw settings as layered from defaults, an optional file and the
/// environment. Nothing here is validated yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub url: String,
    pub interval_seconds: u64,
    pub timeout_seconds: u64,
    pub state_path: String,
    pub once: bool,
    /// Stop after this many completed checks; 0 runs forever.
    pub max_checks: u64,
    pub max_diff_lines: usize,
    pub quiet: bool,
    pub verbose: bool,
    pub sound: bool,
    pub webhook_url: Option<String>,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            state_path: DEFAULT_STATE_PATH.to_string(),
            once: false,
            max_checks: 0,
            max_diff_lines: DEFAULT_MAX_DIFF_LINES,
            quiet: false,
            verbose: false,
            sound: true,
            webhook_url: None,
            log_format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// Layer the settings file (if any) and `SITE_WATCHER_*` variables over
    /// the built-in defaults.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Raise values below their floors, parse URLs and expand the state
    /// path. The watcher logs the effective values when it starts.
    pub fn validate(self) -> Result<Config, ConfigError> {
        let url = parse_http_url("url", &self.url)?;
        let webhook_url = self
            .webhook_url
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(|value| parse_http_url("webhook_url", value))
            .transpose()?;

        Ok(Config {
            url,
            interval: Duration::from_secs(self.interval_seconds.max(MIN_INTERVAL_SECONDS)),
            timeout: Duration::from_secs(self.timeout_seconds.max(MIN_TIMEOUT_SECONDS)),
            state_path: expand_home(&self.state_path),
            once: self.once,
            max_checks: self.max_checks,
            max_diff_lines: self.max_diff_lines.max(MIN_DIFF_LINES),
            quiet: self.quiet,
            verbose: self.verbose,
            sound: self.sound,
            webhook_url,
            log_format: self.log_format,
        })
    }
}

/// Validated configuration consumed by the watcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub url: Url,
    pub interval: Duration,
    pub timeout: Duration,
    pub state_path: PathBuf,
    pub once: bool,
    pub max_checks: u64,
    pub max_diff_lines: usize,
    pub quiet: bool,
    pub verbose: bool,
    pub sound: bool,
    pub webhook_url: Option<Url>,
    pub log_format: LogFormat,
}

impl Config {
    /// Configuration for watching `url` with every other setting at its
    /// default.
    pub fn for_url(url: &str) -> Result<Self, ConfigError> {
        Settings {
            url: url.to_string(),
            ..Settings::default()
        }
        .validate()
    }

    /// `tracing` filter directive for this crate: `warn` when quiet,
    /// `debug` when verbose, `info` otherwise.
    pub fn log_directive(&self) -> String {
        let level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };
        format!("site_watcher={}", level)
    }
}

fn parse_http_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme {
            field,
            value: value.to_string(),
        }),
    }
}

fn expand_home(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(path),
    }
}
