use crate::tools::{Clock, ProgressTracker};
use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 包裝上傳來源，每讀取一段就回報進度
///
/// 每段最多 `part_size` 位元組；中斷信號在段與段之間檢查。
pub struct ProgressReader<R> {
    inner: R,
    tracker: ProgressTracker,
    total: u64,
    uploaded: u64,
    part_size: usize,
    clock: Arc<dyn Clock>,
    shutdown_signal: Arc<AtomicBool>,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(
        inner: R,
        tracker: ProgressTracker,
        total: u64,
        part_size: usize,
        clock: Arc<dyn Clock>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            inner,
            tracker,
            total,
            uploaded: 0,
            part_size: part_size.max(1),
            clock,
            shutdown_signal,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.shutdown_signal.load(Ordering::SeqCst) {
            return Err(io::Error::other("上傳已取消"));
        }

        let limit = buf.len().min(self.part_size);
        let read = self.inner.read(&mut buf[..limit])?;

        self.uploaded += read as u64;
        if read > 0 || self.uploaded >= self.total {
            self.tracker
                .sample(self.uploaded, self.total, self.clock.now());
        }

        Ok(read)
    }
}
