//! Transmission daemon 的 JSON-RPC 轉接
//!
//! 只使用 `torrent-add`、`torrent-get`、`torrent-set`、`torrent-remove` 四個方法。

use super::client::{FileEntry, PiecePriority, TransferClient, TransferHandle};
use super::descriptor::TransferDescriptor;
use crate::config::TransmissionSettings;
use crate::tools::Clock;
use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SESSION_HEADER: &str = "X-Transmission-Session-Id";
const RPC_TIMEOUT: Duration = Duration::from_secs(30);
/// tr_stat_errtype 的 TR_STAT_LOCAL_ERROR
const LOCAL_ERROR: i64 = 3;

const METADATA_FIELDS: [&str; 8] = [
    "id",
    "name",
    "totalSize",
    "metadataPercentComplete",
    "files",
    "downloadDir",
    "error",
    "errorString",
];

#[derive(Debug, Deserialize)]
struct RpcReply<T> {
    result: String,
    arguments: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TorrentRef {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AddedTorrent {
    #[serde(rename = "torrent-added")]
    added: Option<TorrentRef>,
    #[serde(rename = "torrent-duplicate")]
    duplicate: Option<TorrentRef>,
}

#[derive(Debug, Deserialize)]
struct TorrentList {
    torrents: Vec<TorrentInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TorrentInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    total_size: u64,
    #[serde(default)]
    metadata_percent_complete: f64,
    #[serde(default)]
    files: Vec<TorrentFile>,
    #[serde(default)]
    download_dir: String,
    #[serde(default)]
    error: i64,
    #[serde(default)]
    error_string: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TorrentFile {
    name: String,
    length: u64,
    #[serde(default)]
    bytes_completed: u64,
}

/// 單一 RPC 端點，處理 session id 交握
struct RpcConnection {
    http: Client,
    url: String,
    username: Option<String>,
    password: Option<String>,
    session_id: Mutex<Option<String>>,
}

impl RpcConnection {
    fn call<T: DeserializeOwned>(&self, method: &str, arguments: Value) -> Result<T> {
        let body = json!({ "method": method, "arguments": arguments });

        let mut response = self.post(&body)?;
        if response.status() == StatusCode::CONFLICT {
            let session_id = response
                .headers()
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| anyhow!("Transmission 回應 409 但沒有 session id"))?
                .to_string();
            debug!("更新 Transmission session id");
            if let Ok(mut current) = self.session_id.lock() {
                *current = Some(session_id);
            }
            response = self.post(&body)?;
        }

        let response = response
            .error_for_status()
            .with_context(|| format!("Transmission {method} 請求失敗"))?;
        let reply: RpcReply<T> = response
            .json()
            .with_context(|| format!("無法解析 Transmission {method} 回應"))?;

        if reply.result != "success" {
            bail!("Transmission {method} 失敗: {}", reply.result);
        }

        reply
            .arguments
            .ok_or_else(|| anyhow!("Transmission {method} 回應缺少 arguments"))
    }

    fn post(&self, body: &Value) -> Result<Response> {
        let mut request = self.http.post(&self.url).json(body);

        if let Some(session_id) = self.session_id.lock().ok().and_then(|id| id.clone()) {
            request = request.header(SESSION_HEADER, session_id);
        }
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        request
            .send()
            .with_context(|| format!("無法連線到 Transmission: {}", self.url))
    }

    fn torrent(&self, id: i64, fields: &[&str]) -> Result<TorrentInfo> {
        let list: TorrentList =
            self.call("torrent-get", json!({ "ids": [id], "fields": fields }))?;
        list.torrents
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Transmission 找不到 torrent {id}"))
    }
}

/// Transmission daemon client
///
/// `download_root` 必須是絕對路徑，daemon 與本程式才會指向同一個資料夾。
pub struct TransmissionClient {
    rpc: Arc<RpcConnection>,
    download_root: PathBuf,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    shutdown_signal: Arc<AtomicBool>,
}

impl TransmissionClient {
    pub fn new(
        settings: &TransmissionSettings,
        download_root: &Path,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Result<Self> {
        if !download_root.is_absolute() {
            bail!("下載路徑必須是絕對路徑: {}", download_root.display());
        }

        let http = Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .context("無法建立 HTTP client")?;

        Ok(Self {
            rpc: Arc::new(RpcConnection {
                http,
                url: settings.url.clone(),
                username: settings.username.clone(),
                password: settings.password.clone(),
                session_id: Mutex::new(None),
            }),
            download_root: download_root.to_path_buf(),
            clock,
            poll_interval,
            shutdown_signal,
        })
    }
}

impl TransferClient for TransmissionClient {
    type Handle = TransmissionTorrent;

    fn add_by_descriptor(&self, descriptor: &TransferDescriptor) -> Result<TransmissionTorrent> {
        let added: AddedTorrent = self.rpc.call(
            "torrent-add",
            json!({
                "filename": descriptor.as_str(),
                "download-dir": self.download_root.to_string_lossy(),
            }),
        )?;

        let (torrent, owned) = match (added.added, added.duplicate) {
            (Some(torrent), _) => (torrent, true),
            (None, Some(torrent)) => {
                debug!("torrent 已存在: {}", torrent.id);
                (torrent, false)
            }
            (None, None) => bail!("Transmission torrent-add 沒有回傳 torrent"),
        };

        Ok(TransmissionTorrent {
            rpc: Arc::clone(&self.rpc),
            id: torrent.id,
            owned,
            download_root: self.download_root.clone(),
            name: torrent.name,
            total_length: 0,
            files: Vec::new(),
            clock: Arc::clone(&self.clock),
            poll_interval: self.poll_interval,
            shutdown_signal: Arc::clone(&self.shutdown_signal),
        })
    }
}

/// Transmission 中的一個 torrent
pub struct TransmissionTorrent {
    rpc: Arc<RpcConnection>,
    id: i64,
    /// 由本程式加入；既有的 torrent 關閉時不移除
    owned: bool,
    download_root: PathBuf,
    name: String,
    total_length: u64,
    files: Vec<FileEntry>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    shutdown_signal: Arc<AtomicBool>,
}

impl TransferHandle for TransmissionTorrent {
    fn await_metadata(&mut self) -> Result<()> {
        loop {
            let info = self.rpc.torrent(self.id, &METADATA_FIELDS)?;

            if info.error == LOCAL_ERROR {
                bail!("Transmission 錯誤: {}", info.error_string);
            }

            let download_dir = Path::new(&info.download_dir);
            if !info.download_dir.is_empty() && download_dir != self.download_root.as_path() {
                bail!(
                    "torrent 位於其他下載資料夾: {} (預期 {})",
                    info.download_dir,
                    self.download_root.display()
                );
            }

            if info.metadata_percent_complete >= 1.0 && !info.files.is_empty() {
                self.name = info.name;
                self.total_length = info.total_size;
                self.files = info
                    .files
                    .into_iter()
                    .enumerate()
                    .map(|(index, file)| FileEntry {
                        index,
                        path: PathBuf::from(file.name),
                        length: file.length,
                    })
                    .collect();
                return Ok(());
            }

            if self.shutdown_signal.load(Ordering::SeqCst) {
                bail!("等待 metadata 時收到中斷信號");
            }
            self.clock.sleep(self.poll_interval);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn total_length(&self) -> u64 {
        self.total_length
    }

    fn files(&self) -> &[FileEntry] {
        &self.files
    }

    fn set_priority(&self, file: &FileEntry, priority: PiecePriority) -> Result<()> {
        let key = match priority {
            PiecePriority::Normal => "priority-normal",
            PiecePriority::High => "priority-high",
        };
        let _: Value = self.rpc.call(
            "torrent-set",
            json!({ "ids": [self.id], key: [file.index], "files-wanted": [file.index] }),
        )?;
        Ok(())
    }

    fn bytes_completed(&self, file: &FileEntry) -> Result<u64> {
        let info = self.rpc.torrent(self.id, &["id", "files"])?;
        info.files
            .get(file.index)
            .map(|f| f.bytes_completed)
            .ok_or_else(|| anyhow!("torrent {} 沒有第 {} 個檔案", self.id, file.index))
    }

    fn close(self) -> Result<()> {
        if !self.owned {
            debug!("保留既有的 torrent: {}", self.id);
            return Ok(());
        }
        let _: Value = self.rpc.call(
            "torrent-remove",
            json!({ "ids": [self.id], "delete-local-data": false }),
        )?;
        Ok(())
    }
}
