//! 整合測試用的記憶體內協作者

#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use auto_video_publish::component::publish_session::{Messenger, OutgoingMedia};
use auto_video_publish::component::transfer_session::{
    FileEntry, PiecePriority, TransferClient, TransferDescriptor, TransferHandle,
};
use auto_video_publish::tools::{
    MediaTool, ProgressObserver, ProgressReporter, ProgressSnapshot, ProgressTracker,
};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const MAGNET: &str = "magnet:?xt=urn:btih:c9e15763f722f23e98a29decdfae341b98d53056&dn=demo";

pub const PROBE_JSON: &str = r#"{
    "streams": [{"codec_type": "video", "width": 1280, "height": 720}],
    "format": {"duration": "120.000000"}
}"#;

/// 送到頻道的內容
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Video {
        caption: String,
        mime: String,
        thumbnail: Option<String>,
        duration: Option<Duration>,
        resolution: Option<(u32, u32)>,
    },
    Photo(String),
    Album(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct FakeUpload {
    pub name: String,
    pub path: PathBuf,
}

type SendHook = Box<dyn Fn(&Path) + Send + Sync>;

/// 記錄所有上傳與送出的 messenger
#[derive(Default)]
pub struct FakeMessenger {
    pub uploads: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<Sent>>,
    fail_prefixes: Vec<String>,
    fail_video_send: bool,
    fail_album_send: bool,
    after_video: Option<SendHook>,
}

impl FakeMessenger {
    /// 檔名以 `prefix` 開頭的上傳會失敗
    #[must_use]
    pub fn failing_uploads(mut self, prefix: &str) -> Self {
        self.fail_prefixes.push(prefix.to_string());
        self
    }

    /// 影片訊息送出失敗
    #[must_use]
    pub const fn failing_video_send(mut self) -> Self {
        self.fail_video_send = true;
        self
    }

    /// 相簿送出失敗
    #[must_use]
    pub const fn failing_album_send(mut self) -> Self {
        self.fail_album_send = true;
        self
    }

    /// 影片送出後執行
    #[must_use]
    pub fn after_video_sent(mut self, hook: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.after_video = Some(Box::new(hook));
        self
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }
}

impl Messenger for FakeMessenger {
    type Target = String;
    type Upload = FakeUpload;

    fn connect(&self) -> Result<()> {
        Ok(())
    }

    fn disconnect(&self) {}

    fn resolve(&self, channel: &str) -> Result<String> {
        Ok(channel.to_string())
    }

    fn upload_from_path(
        &self,
        path: &Path,
        mut tracker: ProgressTracker,
        _part_size: usize,
    ) -> Result<FakeUpload> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.uploads.lock().unwrap().push(name.clone());

        if self.fail_prefixes.iter().any(|p| name.starts_with(p)) {
            bail!("simulated upload failure: {name}");
        }

        let len = fs::metadata(path)?.len();
        tracker.sample(len, len, Instant::now());

        Ok(FakeUpload {
            name,
            path: path.to_path_buf(),
        })
    }

    fn send_media(&self, _target: &String, media: OutgoingMedia<FakeUpload>) -> Result<()> {
        match media {
            OutgoingMedia::Video(document) => {
                if self.fail_video_send {
                    bail!("simulated sendVideo failure: {}", document.caption);
                }
                self.sent.lock().unwrap().push(Sent::Video {
                    caption: document.caption,
                    mime: document.mime,
                    thumbnail: document.thumbnail.map(|t| t.name),
                    duration: document.duration,
                    resolution: document.resolution,
                });
                if let Some(hook) = &self.after_video {
                    hook(&document.file.path);
                }
            }
            OutgoingMedia::Photo(photo) => {
                self.sent.lock().unwrap().push(Sent::Photo(photo.name));
            }
        }
        Ok(())
    }

    fn send_album(&self, _target: &String, first: FakeUpload, rest: Vec<FakeUpload>) -> Result<()> {
        if self.fail_album_send {
            bail!("simulated sendMediaGroup failure");
        }
        let names = std::iter::once(first)
            .chain(rest)
            .map(|upload| upload.name)
            .collect();
        self.sent.lock().unwrap().push(Sent::Album(names));
        Ok(())
    }
}

/// 寫出假圖片的媒體工具
#[derive(Default)]
pub struct FakeMediaTool {
    probe_json: Option<String>,
    fail_extract_at: Option<usize>,
    pub probes: AtomicUsize,
    pub extracts: AtomicUsize,
}

impl FakeMediaTool {
    #[must_use]
    pub fn probing(json: &str) -> Self {
        Self {
            probe_json: Some(json.to_string()),
            ..Self::default()
        }
    }

    /// 探測一律失敗
    #[must_use]
    pub fn broken() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn failing_extract_at(mut self, index: usize) -> Self {
        self.fail_extract_at = Some(index);
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn extract_count(&self) -> usize {
        self.extracts.load(Ordering::SeqCst)
    }
}

impl MediaTool for FakeMediaTool {
    fn probe(&self, path: &Path) -> Result<String> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.probe_json
            .clone()
            .ok_or_else(|| anyhow!("ffprobe exited with status 1: {}", path.display()))
    }

    fn extract_frame(&self, _path: &Path, timestamp: &str, output: &Path) -> Result<()> {
        let index = self.extracts.fetch_add(1, Ordering::SeqCst);
        if self.fail_extract_at == Some(index) {
            bail!("ffmpeg failed at {timestamp}");
        }
        fs::write(output, b"\xff\xd8\xff\xe0fake-jpeg")?;
        Ok(())
    }
}

/// 依標籤收集進度快照
#[derive(Default)]
pub struct RecordingReporter {
    pub snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
}

impl RecordingReporter {
    pub fn for_label(&self, label: &str) -> Vec<ProgressSnapshot> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.label == label)
            .cloned()
            .collect()
    }
}

struct RecordingObserver(Arc<Mutex<Vec<ProgressSnapshot>>>);

impl ProgressObserver for RecordingObserver {
    fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        self.0.lock().unwrap().push(snapshot.clone());
    }
}

impl ProgressReporter for RecordingReporter {
    fn observer(&self, _label: &str) -> Box<dyn ProgressObserver> {
        Box::new(RecordingObserver(Arc::clone(&self.snapshots)))
    }
}

/// 依腳本回報進度的傳輸
pub struct ScriptedTransfer {
    name: String,
    files: Vec<(FileEntry, Vec<u64>)>,
    pub polls: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl ScriptedTransfer {
    /// 每個檔案給定長度與依序回報的完成位元組數
    pub fn new(name: &str, files: Vec<(&str, u64, Vec<u64>)>) -> Self {
        Self {
            name: name.to_string(),
            files: files
                .into_iter()
                .enumerate()
                .map(|(index, (path, length, progress))| {
                    (
                        FileEntry {
                            index,
                            path: PathBuf::from(path),
                            length,
                        },
                        progress,
                    )
                })
                .collect(),
            polls: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TransferClient for ScriptedTransfer {
    type Handle = ScriptedHandle;

    fn add_by_descriptor(&self, descriptor: &TransferDescriptor) -> Result<ScriptedHandle> {
        if descriptor.as_str().contains("dn=unresolvable") {
            bail!("metadata never arrived");
        }

        Ok(ScriptedHandle {
            name: self.name.clone(),
            files: self.files.iter().map(|(f, _)| f.clone()).collect(),
            progress: Mutex::new(
                self.files
                    .iter()
                    .map(|(f, p)| (f.index, p.iter().copied().collect()))
                    .collect(),
            ),
            polls: Arc::clone(&self.polls),
            closed: Arc::clone(&self.closed),
        })
    }
}

pub struct ScriptedHandle {
    name: String,
    files: Vec<FileEntry>,
    progress: Mutex<HashMap<usize, VecDeque<u64>>>,
    polls: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl TransferHandle for ScriptedHandle {
    fn await_metadata(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn total_length(&self) -> u64 {
        self.files.iter().map(|f| f.length).sum()
    }

    fn files(&self) -> &[FileEntry] {
        &self.files
    }

    fn set_priority(&self, _file: &FileEntry, _priority: PiecePriority) -> Result<()> {
        Ok(())
    }

    fn bytes_completed(&self, file: &FileEntry) -> Result<u64> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut progress = self.progress.lock().unwrap();
        let queue = progress
            .get_mut(&file.index)
            .ok_or_else(|| anyhow!("unknown file {}", file.index))?;
        match queue.len() {
            0 => Ok(file.length),
            1 => Ok(queue[0]),
            _ => Ok(queue.pop_front().unwrap_or(file.length)),
        }
    }

    fn close(self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 在 `root` 下建立指定大小的檔案
pub fn create_file(root: &Path, relative: &str, len: usize) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, vec![0u8; len]).unwrap();
    path
}
