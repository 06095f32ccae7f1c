use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_PROFILE: &str = "telegram";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_TRANSMISSION_URL: &str = "http://127.0.0.1:9091/transmission/rpc";
/// 上傳分段大小 512 KiB
pub const DEFAULT_UPLOAD_PART_SIZE: usize = 512 * 1024;
/// `sendMediaGroup` 一次最多 10 張
pub const MAX_PREVIEW_COUNT: usize = 10;
/// Bot API 上傳上限（MB）
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 50;

/// 設定檔
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// 預設使用的 profile 名稱
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default)]
    pub telegram: Vec<TelegramProfile>,
    #[serde(default, alias = "deleteaferupload")]
    pub delete_after_upload: bool,
    #[serde(default = "default_download_path")]
    pub download_path: PathBuf,
    #[serde(default)]
    pub transmission: TransmissionSettings,
    #[serde(default = "default_preview_count")]
    pub preview_count: usize,
    #[serde(default = "default_interval_ms")]
    pub progress_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_upload_part_size")]
    pub upload_part_size: usize,
}

/// 訊息平台連線設定
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramProfile {
    pub name: String,
    pub bot_token: String,
    #[serde(alias = "channelid")]
    pub channel_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// 覆寫全域下載路徑
    #[serde(default)]
    pub download_path: Option<PathBuf>,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
}

/// Transmission RPC 設定
#[derive(Debug, Clone, Deserialize)]
pub struct TransmissionSettings {
    #[serde(default = "default_transmission_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for TransmissionSettings {
    fn default() -> Self {
        Self {
            url: default_transmission_url(),
            username: None,
            password: None,
        }
    }
}

/// 管線核心實際讀取的設定，由 [`Config`] 與選定的 profile 組合而成
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub channel_id: String,
    pub download_root: PathBuf,
    pub delete_after_upload: bool,
    pub preview_count: usize,
    pub progress_interval: Duration,
    pub poll_interval: Duration,
    pub upload_part_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            download_root: default_download_path(),
            delete_after_upload: false,
            preview_count: default_preview_count(),
            progress_interval: Duration::from_millis(default_interval_ms()),
            poll_interval: Duration::from_millis(default_interval_ms()),
            upload_part_size: DEFAULT_UPLOAD_PART_SIZE,
        }
    }
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

fn default_download_path() -> PathBuf {
    PathBuf::from("downloads")
}

const fn default_preview_count() -> usize {
    crate::tools::DEFAULT_PREVIEW_COUNT
}

const fn default_interval_ms() -> u64 {
    1000
}

const fn default_upload_part_size() -> usize {
    DEFAULT_UPLOAD_PART_SIZE
}

fn default_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}

const fn default_max_upload_mb() -> u64 {
    DEFAULT_MAX_UPLOAD_MB
}

fn default_transmission_url() -> String {
    DEFAULT_TRANSMISSION_URL.to_string()
}
