pub mod cli;
pub mod toml_config;

use crate::adapters::browser::BrowserOptions;
use crate::domain::model::Allowlist;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_site_ids, validate_url,
    validate_url_template, Validate,
};
use std::time::Duration;
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "venue-capture")]
#[command(about = "Aggregate venue showtimes into a captured browser session record")]
pub struct CliConfig {
    /// Capture record to enrich
    #[arg(short, long)]
    pub input: Option<String>,

    /// Where to write the enriched record (defaults to the input path)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// DevTools endpoint of a browser started with --remote-debugging-port
    #[arg(long)]
    pub devtools_url: Option<String>,

    /// Replay per-venue stores from <dir>/<slug>.json instead of a browser
    #[arg(long)]
    pub snapshot_dir: Option<String>,

    /// Site identifiers to keep, comma separated
    #[arg(long, value_delimiter = ',')]
    pub allow: Vec<String>,

    /// localStorage key holding the browsing store
    #[arg(long)]
    pub store_key: Option<String>,

    /// Venue page URL with a {slug} placeholder
    #[arg(long)]
    pub venue_url: Option<String>,

    /// Only print which venues would be visited
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

/// 合併後的執行設定：設定檔為底，命令列參數覆蓋
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input: String,
    pub output: String,
    pub store_key: String,
    pub allowlist: Vec<String>,
    pub venue_url_template: String,
    pub devtools_url: String,
    pub snapshot_dir: Option<String>,
    pub command_timeout: Duration,
    pub load_timeout: Duration,
    pub settle: Duration,
}

impl From<TomlConfig> for Settings {
    fn from(file: TomlConfig) -> Self {
        let output = file
            .capture
            .output
            .unwrap_or_else(|| file.capture.input.clone());
        Self {
            input: file.capture.input,
            output,
            store_key: file.capture.store_key,
            allowlist: file.venues.allowlist,
            venue_url_template: file.venues.url_template,
            devtools_url: file.browser.devtools_url,
            snapshot_dir: file.replay.map(|replay| replay.snapshot_dir),
            command_timeout: Duration::from_secs(file.browser.command_timeout_seconds),
            load_timeout: Duration::from_secs(file.browser.load_timeout_seconds),
            settle: Duration::from_millis(file.browser.settle_millis),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

impl Settings {
    #[cfg(feature = "cli")]
    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };
        let file_output = file.capture.output.clone();
        let mut settings = Settings::from(file);

        if let Some(input) = &cli.input {
            settings.input = input.clone();
            // Output follows the input unless set explicitly somewhere.
            settings.output = file_output.unwrap_or_else(|| input.clone());
        }
        if let Some(output) = &cli.output {
            settings.output = output.clone();
        }
        if let Some(url) = &cli.devtools_url {
            settings.devtools_url = url.clone();
        }
        if let Some(dir) = &cli.snapshot_dir {
            settings.snapshot_dir = Some(dir.clone());
        }
        if !cli.allow.is_empty() {
            settings.allowlist = cli.allow.clone();
        }
        if let Some(key) = &cli.store_key {
            settings.store_key = key.clone();
        }
        if let Some(url) = &cli.venue_url {
            settings.venue_url_template = url.clone();
        }

        Ok(settings)
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            devtools_url: self.devtools_url.clone(),
            venue_url_template: self.venue_url_template.clone(),
            store_key: self.store_key.clone(),
            command_timeout: self.command_timeout,
            load_timeout: self.load_timeout,
            settle: self.settle,
        }
    }
}

impl ConfigProvider for Settings {
    fn store_key(&self) -> &str {
        &self.store_key
    }

    fn allowlist(&self) -> Allowlist {
        Allowlist::new(self.allowlist.iter().map(|id| id.trim()))
    }

    fn venue_url_template(&self) -> &str {
        &self.venue_url_template
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_path("capture.input", &self.input)?;
        validate_path("capture.output", &self.output)?;
        validate_non_empty_string("capture.store_key", &self.store_key)?;
        validate_site_ids("venues.allowlist", &self.allowlist)?;
        validate_url_template("venues.url_template", &self.venue_url_template)?;
        match &self.snapshot_dir {
            Some(dir) => validate_path("replay.snapshot_dir", dir)?,
            None => validate_url(
                "browser.devtools_url",
                &self.devtools_url,
                &["http", "https", "ws", "wss"],
            )?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.output, settings.input);
        let allowlist = settings.allowlist();
        for site_id in crate::config::toml_config::DEFAULT_ALLOWLIST {
            assert!(allowlist.contains(site_id));
        }
        assert!(!allowlist.contains("XXX1"));
    }

    #[test]
    fn test_browser_options_carry_timeouts() {
        let settings = Settings::default();
        let options = settings.browser_options();
        assert_eq!(options.settle, Duration::from_millis(3000));
        assert_eq!(options.load_timeout, Duration::from_secs(120));
        assert_eq!(options.store_key, settings.store_key);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.allowlist.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.venue_url_template = "https://www.curzon.com/venues/".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.devtools_url = "localhost".to_string();
        assert!(settings.validate().is_err());

        // A snapshot directory replaces the browser endpoint.
        settings.snapshot_dir = Some("fixtures".to_string());
        assert!(settings.validate().is_ok());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_overrides() {
        let cli = CliConfig::parse_from([
            "venue-capture",
            "--input",
            "in.json",
            "--allow",
            "MAY1,BLO1",
            "--snapshot-dir",
            "snaps",
        ]);
        let settings = Settings::resolve(&cli).unwrap();

        assert_eq!(settings.input, "in.json");
        assert_eq!(settings.output, "in.json");
        assert_eq!(settings.allowlist, vec!["MAY1", "BLO1"]);
        assert_eq!(settings.snapshot_dir.as_deref(), Some("snaps"));
        assert_eq!(settings.store_key, toml_config::DEFAULT_STORE_KEY);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_output_override() {
        let cli = CliConfig::parse_from(["venue-capture", "-i", "a.json", "-o", "b.json"]);
        let settings = Settings::resolve(&cli).unwrap();
        assert_eq!(settings.input, "a.json");
        assert_eq!(settings.output, "b.json");
    }
}
