use super::media_type::video_mime;
use super::messenger::{Messenger, OutgoingMedia, VideoDocument};
use crate::config::PipelineSettings;
use crate::error::PipelineError;
use crate::tools::{
    Clock, ExtractionCapability, MediaMetadata, MediaTool, ProgressReporter, ProgressTracker,
    RateMode, ScopedDirectory, extract_random_frames, probe_media, validate_file_exists,
};
use anyhow::{Context, Result};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// 單一檔案發布流程中經過的狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Queued,
    ProbeAttempted,
    EnrichedUpload,
    BareUpload,
    Sent,
    Retained,
    Deleted,
    Failed,
}

/// 送出後本機檔案的去留
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    Retained,
    Deleted,
}

/// 單一檔案的發布結果
#[derive(Debug)]
pub struct PublishOutcome {
    pub path: PathBuf,
    pub states: Vec<PublishState>,
    pub warnings: Vec<String>,
    pub result: Result<Retention, PipelineError>,
}

impl PublishOutcome {
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.states.contains(&PublishState::Sent)
    }

    #[must_use]
    pub fn final_state(&self) -> Option<PublishState> {
        self.states.last().copied()
    }

    #[must_use]
    pub fn used_enriched_path(&self) -> bool {
        self.states.contains(&PublishState::EnrichedUpload)
    }
}

/// 發布過程紀錄
struct PublishRun {
    path: PathBuf,
    states: Vec<PublishState>,
    warnings: Vec<String>,
}

impl PublishRun {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            states: vec![PublishState::Queued],
            warnings: Vec::new(),
        }
    }

    fn enter(&mut self, state: PublishState) {
        self.states.push(state);
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    fn finish(mut self, result: Result<Retention, PipelineError>) -> PublishOutcome {
        if result.is_err() {
            self.enter(PublishState::Failed);
        }
        PublishOutcome {
            path: self.path,
            states: self.states,
            warnings: self.warnings,
            result,
        }
    }
}

/// 將下載完成的檔案發布到頻道
pub struct PublishSession<M: Messenger> {
    messenger: Arc<M>,
    target: M::Target,
    media_tool: Arc<dyn MediaTool>,
    capability: Arc<dyn ExtractionCapability>,
    reporter: Arc<dyn ProgressReporter>,
    clock: Arc<dyn Clock>,
    settings: PipelineSettings,
    rng: StdRng,
}

impl<M: Messenger> PublishSession<M> {
    /// 解析頻道並建立 session
    pub fn new(
        messenger: Arc<M>,
        settings: PipelineSettings,
        media_tool: Arc<dyn MediaTool>,
        capability: Arc<dyn ExtractionCapability>,
        reporter: Arc<dyn ProgressReporter>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let target = messenger
            .resolve(&settings.channel_id)
            .with_context(|| format!("無法解析頻道: {}", settings.channel_id))?;

        Ok(Self {
            messenger,
            target,
            media_tool,
            capability,
            reporter,
            clock,
            settings,
            rng: StdRng::from_rng(&mut rand::rng()),
        })
    }

    /// 以固定種子取代隨機來源
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// 發布一個檔案，`relative_path` 相對於下載根目錄
    pub fn publish(&mut self, relative_path: &Path) -> PublishOutcome {
        let local = self.settings.download_root.join(relative_path);
        info!("開始發布: {}", local.display());

        let mut run = PublishRun::new(local.clone());
        let result = self.run(&mut run, relative_path, &local);

        match &result {
            Ok(Retention::Deleted) => info!("發布完成並已刪除: {}", local.display()),
            Ok(Retention::Retained) => info!("發布完成: {}", local.display()),
            Err(e) => warn!("發布失敗 [{}]: {e}", e.kind()),
        }

        run.finish(result)
    }

    fn run(
        &mut self,
        run: &mut PublishRun,
        relative_path: &Path,
        local: &Path,
    ) -> Result<Retention, PipelineError> {
        if validate_file_exists(local).is_err() {
            return Err(PipelineError::FileNotFound {
                path: local.to_path_buf(),
            });
        }

        let caption = relative_path.to_string_lossy().into_owned();
        let mime = video_mime(local);

        if self.capability.available() {
            run.enter(PublishState::ProbeAttempted);
            let metadata = probe_media(self.media_tool.as_ref(), local)?;
            info!(
                "影片資訊: {:.2}s, {}x{}",
                metadata.duration_seconds, metadata.width, metadata.height
            );

            run.enter(PublishState::EnrichedUpload);
            self.publish_enriched(run, local, caption, mime, &metadata)?;
        } else {
            info!("找不到 ffmpeg，以一般模式上傳");
            run.enter(PublishState::BareUpload);
            self.publish_bare(local, caption, mime)?;
        }

        run.enter(PublishState::Sent);
        Ok(self.apply_retention(run, local))
    }

    fn publish_enriched(
        &mut self,
        run: &mut PublishRun,
        local: &Path,
        caption: String,
        mime: &str,
        metadata: &MediaMetadata,
    ) -> Result<(), PipelineError> {
        let frames_dir = preview_directory(local);
        let scoped = ScopedDirectory::create(frames_dir.clone()).map_err(|source| {
            PipelineError::Directory {
                path: frames_dir,
                source,
            }
        })?;

        let frames = extract_random_frames(
            self.media_tool.as_ref(),
            local,
            metadata.duration_seconds,
            self.settings.preview_count,
            scoped.path(),
            &mut self.rng,
        )?;

        let thumbnail = match frames.first() {
            Some(frame) => Some(self.upload(frame, "thumbnail")?),
            None => None,
        };
        let file = self.upload(local, &display_name(local))?;

        let document = VideoDocument {
            file,
            caption,
            mime: mime.to_string(),
            thumbnail,
            duration: Duration::try_from_secs_f64(metadata.duration_seconds).ok(),
            resolution: metadata
                .has_resolution()
                .then_some((metadata.width, metadata.height)),
            supports_streaming: true,
        };

        self.messenger
            .send_media(&self.target, OutgoingMedia::Video(document))
            .map_err(|e| PipelineError::send(local, e))?;
        info!("影片已送出: {}", local.display());

        self.send_previews(run, local, &frames)
    }

    fn publish_bare(&self, local: &Path, caption: String, mime: &str) -> Result<(), PipelineError> {
        let file = self.upload(local, &display_name(local))?;
        let document = VideoDocument::bare(file, caption, mime);

        self.messenger
            .send_media(&self.target, OutgoingMedia::Video(document))
            .map_err(|e| PipelineError::send(local, e))?;
        info!("影片已送出: {}", local.display());
        Ok(())
    }

    /// 上傳預覽圖：兩張以上組成相簿，一張單獨送出
    fn send_previews(
        &self,
        run: &mut PublishRun,
        local: &Path,
        frames: &[PathBuf],
    ) -> Result<(), PipelineError> {
        let mut photos = Vec::with_capacity(frames.len());
        for frame in frames {
            match self.upload(frame, &display_name(frame)) {
                Ok(photo) => photos.push(photo),
                Err(e) => run.warn(format!("略過預覽圖: {e}")),
            }
        }

        let mut photos = photos.into_iter();
        let Some(first) = photos.next() else {
            return Ok(());
        };
        let rest: Vec<M::Upload> = photos.collect();
        let count = rest.len() + 1;

        let sent = if rest.is_empty() {
            self.messenger
                .send_media(&self.target, OutgoingMedia::Photo(first))
        } else {
            self.messenger.send_album(&self.target, first, rest)
        };
        sent.map_err(|e| PipelineError::send(local, e.context("預覽圖送出失敗")))?;

        info!("已送出 {count} 張預覽圖");
        Ok(())
    }

    fn upload(&self, path: &Path, label: &str) -> Result<M::Upload, PipelineError> {
        let tracker = ProgressTracker::with_reporter(
            self.reporter.as_ref(),
            label,
            RateMode::SinceStart,
            self.settings.progress_interval,
            self.clock.now(),
        );

        self.messenger
            .upload_from_path(path, tracker, self.settings.upload_part_size)
            .map_err(|e| PipelineError::upload(path, e))
    }

    fn apply_retention(&self, run: &mut PublishRun, local: &Path) -> Retention {
        if !self.settings.delete_after_upload {
            info!("保留檔案: {}", local.display());
            run.enter(PublishState::Retained);
            return Retention::Retained;
        }

        match fs::remove_file(local) {
            Ok(()) => {
                info!("已刪除檔案: {}", local.display());
                run.enter(PublishState::Deleted);
                Retention::Deleted
            }
            Err(e) => {
                run.warn(format!("無法刪除檔案 {}: {e}", local.display()));
                run.enter(PublishState::Retained);
                Retention::Retained
            }
        }
    }
}

/// 影片旁的 `frames_<stem>` 資料夾
#[must_use]
pub fn preview_directory(video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map_or_else(|| "video".into(), |s| s.to_string_lossy());
    video.with_file_name(format!("frames_{stem}"))
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |n| n.to_string_lossy().into_owned(),
    )
}
