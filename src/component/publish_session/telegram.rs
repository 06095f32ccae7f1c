//! Telegram Bot API 轉接
//!
//! Bot API 沒有獨立的上傳端點：`upload_from_path` 只檢查並暫存檔案，
//! 實際位元組在 `send_*` 的 multipart 請求中串流送出，進度也在那時回報。

use super::messenger::{Messenger, OutgoingMedia, VideoDocument};
use super::progress_reader::ProgressReader;
use crate::config::TelegramProfile;
use crate::tools::format::bytes_to_mb;
use crate::tools::{Clock, ProgressTracker};
use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

const PHOTO_MIME: &str = "image/jpeg";
const THUMBNAIL_FIELD: &str = "thumbnail_file";

#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    #[serde(default)]
    username: Option<String>,
    first_name: String,
}

/// 解析後的頻道
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatTarget {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// 已檢查、等待送出的檔案
pub struct StagedUpload {
    path: PathBuf,
    file_name: String,
    size: u64,
    part_size: usize,
    tracker: ProgressTracker,
}

impl StagedUpload {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }
}

pub struct TelegramBot {
    http: Client,
    api_base: String,
    token: String,
    max_upload_bytes: u64,
    clock: Arc<dyn Clock>,
    shutdown_signal: Arc<AtomicBool>,
}

impl TelegramBot {
    pub fn new(
        profile: &TelegramProfile,
        clock: Arc<dyn Clock>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Result<Self> {
        // 大檔上傳不設整體逾時
        let http = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("無法建立 HTTP client")?;

        Ok(Self {
            http,
            api_base: profile.api_base.trim_end_matches('/').to_string(),
            token: profile.bot_token.clone(),
            max_upload_bytes: profile.max_upload_mb.saturating_mul(1024 * 1024),
            clock,
            shutdown_signal,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    fn parse<T: DeserializeOwned>(method: &str, response: Response) -> Result<T> {
        let status = response.status();
        let reply: ApiReply<T> = response
            .json()
            .with_context(|| format!("無法解析 Telegram {method} 回應 ({status})"))?;

        if !reply.ok {
            bail!(
                "Telegram {method} 失敗: {}",
                reply.description.unwrap_or_else(|| status.to_string())
            );
        }

        reply
            .result
            .ok_or_else(|| anyhow!("Telegram {method} 回應缺少 result"))
    }

    fn post_form(&self, method: &str, form: Form) -> Result<Value> {
        let response = self
            .http
            .post(self.endpoint(method))
            .multipart(form)
            .send()
            .with_context(|| format!("Telegram {method} 請求失敗"))?;
        Self::parse(method, response)
    }

    fn part(&self, upload: StagedUpload, mime: &str) -> Result<Part> {
        let file = File::open(&upload.path)
            .with_context(|| format!("無法開啟檔案: {}", upload.path.display()))?;
        let reader = ProgressReader::new(
            file,
            upload.tracker,
            upload.size,
            upload.part_size,
            Arc::clone(&self.clock),
            Arc::clone(&self.shutdown_signal),
        );

        Part::reader_with_length(reader, upload.size)
            .file_name(upload.file_name)
            .mime_str(mime)
            .with_context(|| format!("無效的 MIME: {mime}"))
    }

    fn video_form(&self, chat_id: String, document: VideoDocument<StagedUpload>) -> Result<Form> {
        let mut form = Form::new()
            .text("chat_id", chat_id)
            .text("caption", format!("<i>{}</i>", escape_html(&document.caption)))
            .text("parse_mode", "HTML")
            .text("supports_streaming", document.supports_streaming.to_string());

        if let Some(duration) = document.duration {
            form = form.text("duration", (duration.as_secs_f64().round() as u64).to_string());
        }
        if let Some((width, height)) = document.resolution {
            form = form
                .text("width", width.to_string())
                .text("height", height.to_string());
        }
        if let Some(thumbnail) = document.thumbnail {
            form = form
                .text("thumbnail", format!("attach://{THUMBNAIL_FIELD}"))
                .part(THUMBNAIL_FIELD, self.part(thumbnail, PHOTO_MIME)?);
        }

        Ok(form.part("video", self.part(document.file, &document.mime)?))
    }
}

impl Messenger for TelegramBot {
    type Target = ChatTarget;
    type Upload = StagedUpload;

    fn connect(&self) -> Result<()> {
        let response = self
            .http
            .get(self.endpoint("getMe"))
            .send()
            .context("無法連線到 Telegram")?;
        let me: BotUser = Self::parse("getMe", response)?;

        info!(
            "已連線到 Telegram: {} (@{})",
            me.first_name,
            me.username.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    fn disconnect(&self) {
        info!("已中斷 Telegram 連線");
    }

    fn resolve(&self, channel: &str) -> Result<ChatTarget> {
        let response = self
            .http
            .post(self.endpoint("getChat"))
            .json(&json!({ "chat_id": channel }))
            .send()
            .context("Telegram getChat 請求失敗")?;
        let target: ChatTarget =
            Self::parse("getChat", response).with_context(|| format!("無法解析頻道: {channel}"))?;

        debug!("頻道 {channel} -> {}", target.id);
        Ok(target)
    }

    fn upload_from_path(
        &self,
        path: &Path,
        tracker: ProgressTracker,
        part_size: usize,
    ) -> Result<StagedUpload> {
        let size = fs::metadata(path)
            .with_context(|| format!("無法讀取檔案資訊: {}", path.display()))?
            .len();

        if size > self.max_upload_bytes {
            bail!(
                "檔案 {:.2} MB 超過上傳上限 {:.2} MB",
                bytes_to_mb(size),
                bytes_to_mb(self.max_upload_bytes)
            );
        }

        let file_name = path
            .file_name()
            .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().into_owned());

        Ok(StagedUpload {
            path: path.to_path_buf(),
            file_name,
            size,
            part_size,
            tracker,
        })
    }

    fn send_media(&self, target: &ChatTarget, media: OutgoingMedia<StagedUpload>) -> Result<()> {
        let chat_id = target.id.to_string();

        match media {
            OutgoingMedia::Video(document) => {
                let form = self.video_form(chat_id, document)?;
                self.post_form("sendVideo", form)?;
            }
            OutgoingMedia::Photo(photo) => {
                let form = Form::new()
                    .text("chat_id", chat_id)
                    .part("photo", self.part(photo, PHOTO_MIME)?);
                self.post_form("sendPhoto", form)?;
            }
        }

        Ok(())
    }

    fn send_album(
        &self,
        target: &ChatTarget,
        first: StagedUpload,
        rest: Vec<StagedUpload>,
    ) -> Result<()> {
        let photos: Vec<StagedUpload> = std::iter::once(first).chain(rest).collect();

        let media: Vec<Value> = (0..photos.len())
            .map(|i| json!({ "type": "photo", "media": format!("attach://photo{i}") }))
            .collect();

        let mut form = Form::new()
            .text("chat_id", target.id.to_string())
            .text("media", Value::Array(media).to_string());
        for (i, photo) in photos.into_iter().enumerate() {
            form = form.part(format!("photo{i}"), self.part(photo, PHOTO_MIME)?);
        }

        self.post_form("sendMediaGroup", form)?;
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
