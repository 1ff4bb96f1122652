use crate::utils::error::{CaptureError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_STORE_KEY: &str = "VistaOmnichannelComponents::browsing-domain-store";
pub const DEFAULT_VENUE_URL: &str = "https://www.curzon.com/venues/{slug}/";
pub const DEFAULT_DEVTOOLS_URL: &str = "http://127.0.0.1:9222";
pub const DEFAULT_ALLOWLIST: [&str; 7] = ["MAY1", "BLO1", "CAM1", "HOX1", "SOH1", "ALD1", "VIC1"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub capture: CaptureSection,
    #[serde(default)]
    pub venues: VenuesSection,
    #[serde(default)]
    pub browser: BrowserSection,
    pub replay: Option<ReplaySection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSection {
    #[serde(default = "default_input")]
    pub input: String,
    pub output: Option<String>,
    #[serde(default = "default_store_key")]
    pub store_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenuesSection {
    #[serde(default = "default_allowlist")]
    pub allowlist: Vec<String>,
    #[serde(default = "default_venue_url")]
    pub url_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserSection {
    #[serde(default = "default_devtools_url")]
    pub devtools_url: String,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
    #[serde(default = "default_load_timeout")]
    pub load_timeout_seconds: u64,
    #[serde(default = "default_settle")]
    pub settle_millis: u64,
}

/// 離線重播：以資料夾內的快照取代瀏覽器
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySection {
    pub snapshot_dir: String,
}

fn default_input() -> String {
    "curzon_tokens.json".to_string()
}

fn default_store_key() -> String {
    DEFAULT_STORE_KEY.to_string()
}

fn default_allowlist() -> Vec<String> {
    DEFAULT_ALLOWLIST.iter().map(|id| id.to_string()).collect()
}

fn default_venue_url() -> String {
    DEFAULT_VENUE_URL.to_string()
}

fn default_devtools_url() -> String {
    DEFAULT_DEVTOOLS_URL.to_string()
}

fn default_command_timeout() -> u64 {
    30
}

fn default_load_timeout() -> u64 {
    120
}

fn default_settle() -> u64 {
    3000
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: None,
            store_key: default_store_key(),
        }
    }
}

impl Default for VenuesSection {
    fn default() -> Self {
        Self {
            allowlist: default_allowlist(),
            url_template: default_venue_url(),
        }
    }
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            devtools_url: default_devtools_url(),
            command_timeout_seconds: default_command_timeout(),
            load_timeout_seconds: default_load_timeout(),
            settle_millis: default_settle(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| CaptureError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DEVTOOLS_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR
            .get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }
}
