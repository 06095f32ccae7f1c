use super::client::{FileEntry, PiecePriority, TransferClient, TransferHandle};
use super::descriptor::TransferDescriptor;
use crate::config::PipelineSettings;
use crate::error::PipelineError;
use crate::tools::format::bytes_to_mb;
use crate::tools::{Clock, ProgressReporter, ProgressTracker, RateMode};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 持有一個傳輸 client 並驅動下載
///
/// 等待檔案完成時不設逾時；卡住的傳輸只能由中斷信號結束。
pub struct TransferSession<C: TransferClient> {
    client: C,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn ProgressReporter>,
    progress_interval: Duration,
    poll_interval: Duration,
    shutdown_signal: Arc<AtomicBool>,
}

impl<C: TransferClient> TransferSession<C> {
    pub fn new(
        client: C,
        settings: &PipelineSettings,
        clock: Arc<dyn Clock>,
        reporter: Arc<dyn ProgressReporter>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            client,
            clock,
            reporter,
            progress_interval: settings.progress_interval,
            poll_interval: settings.poll_interval,
            shutdown_signal,
        }
    }

    /// 加入傳輸並等待 metadata，之後將所有檔案設為高優先
    pub fn submit(&self, descriptor: &TransferDescriptor) -> Result<C::Handle, PipelineError> {
        info!("加入傳輸: {descriptor}");
        let mut handle = self
            .client
            .add_by_descriptor(descriptor)
            .map_err(|e| PipelineError::descriptor(descriptor.as_str(), e))?;

        info!("取得 metadata 中...");
        if let Err(e) = handle.await_metadata() {
            Self::close_quietly(handle);
            if self.is_shutdown() {
                return Err(PipelineError::Cancelled);
            }
            return Err(PipelineError::descriptor(descriptor.as_str(), e));
        }

        info!(
            "metadata 已取得: {} ({:.2} MB, {} 個檔案)",
            handle.name(),
            bytes_to_mb(handle.total_length()),
            handle.files().len()
        );

        // 一律下載完整內容
        for file in handle.files() {
            if let Err(e) = handle.set_priority(file, PiecePriority::High) {
                let err = PipelineError::descriptor(
                    descriptor.as_str(),
                    e.context(format!("無法設定優先順序: {}", file.path.display())),
                );
                Self::close_quietly(handle);
                return Err(err);
            }
        }

        Ok(handle)
    }

    /// 阻塞直到檔案完成，期間以固定間隔回報下載進度
    pub fn await_file(&self, handle: &C::Handle, file: &FileEntry) -> Result<(), PipelineError> {
        info!(
            "下載中 {}: {:.2} MB",
            file.path.display(),
            bytes_to_mb(file.length)
        );

        let mut tracker = ProgressTracker::with_reporter(
            self.reporter.as_ref(),
            &file.display_name(),
            RateMode::Windowed,
            self.progress_interval,
            self.clock.now(),
        );

        loop {
            if self.is_shutdown() {
                warn!("收到中斷信號，停止等待: {}", file.path.display());
                return Err(PipelineError::Cancelled);
            }

            self.clock.sleep(self.poll_interval);

            let completed =
                handle
                    .bytes_completed(file)
                    .map_err(|source| PipelineError::Transfer {
                        path: file.path.clone(),
                        source,
                    })?;

            tracker.sample(completed, file.length, self.clock.now());

            if completed >= file.length {
                info!("下載完成: {}", file.path.display());
                return Ok(());
            }
        }
    }

    /// 結束傳輸，失敗只記錄
    pub fn close(&self, handle: C::Handle) {
        Self::close_quietly(handle);
    }

    fn close_quietly(handle: C::Handle) {
        let name = handle.name().to_string();
        if let Err(e) = handle.close() {
            warn!("無法結束傳輸 {name}: {e:#}");
        }
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown_signal.load(Ordering::SeqCst)
    }
}
