use clap::Parser;
use std::path::PathBuf;

use crate::config::{ConfigError, LogFormat, Settings};

/// Command-line flags. Anything given here wins over the settings file and
/// the environment.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "site-watcher",
    version,
    about = "Watch a web page for visible text changes"
)]
pub struct Cli {
    /// URL to watch (same as --url)
    #[arg(value_name = "URL")]
    pub url_positional: Option<String>,

    /// URL to watch
    #[arg(long)]
    pub url: Option<String>,

    /// Poll interval in seconds (min 10)
    #[arg(long)]
    pub interval: Option<u64>,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to the state JSON file
    #[arg(long)]
    pub state: Option<String>,

    /// Run one check then exit
    #[arg(long)]
    pub once: bool,

    /// Stop after N checks (0 = run forever)
    #[arg(long)]
    pub max_checks: Option<u64>,

    /// Max added/removed lines to print per group
    #[arg(long)]
    pub max_diff_lines: Option<usize>,

    /// Only print on changes and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log every step of each check
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable the audio alert on change
    #[arg(long)]
    pub no_sound: bool,

    /// Also post change reports to this webhook URL
    #[arg(long)]
    pub webhook: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Settings file (TOML, YAML or JSON)
    #[arg(long, env = "SITE_WATCHER_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(url) = self.url.as_ref().or(self.url_positional.as_ref()) {
            settings.url = url.clone();
        }
        if let Some(interval) = self.interval {
            settings.interval_seconds = interval;
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_seconds = timeout;
        }
        if let Some(state) = &self.state {
            settings.state_path = state.clone();
        }
        if let Some(max_checks) = self.max_checks {
            settings.max_checks = max_checks;
        }
        if let Some(max_diff_lines) = self.max_diff_lines {
            settings.max_diff_lines = max_diff_lines;
        }
        if let Some(webhook) = &self.webhook {
            settings.webhook_url = Some(webhook.clone());
        }
        if let Some(format) = self.log_format {
            settings.log_format = format;
        }
        settings.once |= self.once;
        settings.quiet |= self.quiet;
        settings.verbose |= self.verbose;
        if self.no_sound {
            settings.sound = false;
        }
    }

    /// Layer settings: file, environment, then flags. Call
    /// [`Settings::validate`] on the result to get the final config.
    pub fn load_settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = Settings::load(self.config.as_deref())?;
        self.apply(&mut settings);
        Ok(settings)
    }
}
