//! 進度追蹤
//!
//! 將位元組樣本轉換為百分比、速度與剩餘時間，並限制通知頻率。
//! 下載迴圈與上傳迴圈共用同一套計算。

use std::time::{Duration, Instant};

/// 預設通知間隔
pub const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_secs(1);

/// 速度計算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateMode {
    /// 自開始追蹤起的平均速度（上傳用，平滑短期抖動）
    SinceStart,
    /// 兩次通知之間的區間速度（下載即時顯示用）
    Windowed,
}

/// 單次通知的進度快照
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub label: String,
    pub completed: u64,
    pub total: u64,
    pub percent: f64,
    /// 每秒位元組數；無法計算時為 `None`
    pub bytes_per_sec: Option<f64>,
    /// 剩餘時間；速度為零或未知時為 `None`
    pub eta: Option<Duration>,
    pub elapsed: Duration,
    /// 最後一次通知（completed == total）
    pub finished: bool,
}

/// 進度觀察者
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, snapshot: &ProgressSnapshot);
}

/// 依標籤建立觀察者
pub trait ProgressReporter: Send + Sync {
    fn observer(&self, label: &str) -> Box<dyn ProgressObserver>;
}

/// 單一傳輸單位的進度追蹤器
pub struct ProgressTracker {
    label: String,
    mode: RateMode,
    interval: Duration,
    started_at: Instant,
    last_emit_at: Instant,
    last_emit_bytes: u64,
    finished: bool,
    observer: Box<dyn ProgressObserver>,
}

impl ProgressTracker {
    pub fn new(
        label: impl Into<String>,
        mode: RateMode,
        interval: Duration,
        now: Instant,
        observer: Box<dyn ProgressObserver>,
    ) -> Self {
        Self {
            label: label.into(),
            mode,
            interval,
            started_at: now,
            last_emit_at: now,
            last_emit_bytes: 0,
            finished: false,
            observer,
        }
    }

    /// 以 reporter 建立對應標籤的追蹤器
    pub fn with_reporter(
        reporter: &dyn ProgressReporter,
        label: &str,
        mode: RateMode,
        interval: Duration,
        now: Instant,
    ) -> Self {
        Self::new(label, mode, interval, now, reporter.observer(label))
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// 計算快照，不改變追蹤器狀態
    #[must_use]
    pub fn compute(&self, completed: u64, total: u64, now: Instant) -> ProgressSnapshot {
        let elapsed = now.saturating_duration_since(self.started_at);

        if total == 0 {
            return ProgressSnapshot {
                label: self.label.clone(),
                completed,
                total,
                percent: 0.0,
                bytes_per_sec: None,
                eta: None,
                elapsed,
                finished: true,
            };
        }

        let bounded = completed.min(total);
        let percent = bounded as f64 * 100.0 / total as f64;

        let bytes_per_sec = match self.mode {
            RateMode::SinceStart => per_second(bounded, elapsed),
            RateMode::Windowed => per_second(
                bounded.saturating_sub(self.last_emit_bytes),
                now.saturating_duration_since(self.last_emit_at),
            ),
        };

        let remaining = total - bounded;
        let eta = bytes_per_sec
            .filter(|rate| *rate > 0.0)
            .and_then(|rate| Duration::try_from_secs_f64(remaining as f64 / rate).ok());

        ProgressSnapshot {
            label: self.label.clone(),
            completed: bounded,
            total,
            percent,
            bytes_per_sec,
            eta,
            elapsed,
            finished: bounded == total,
        }
    }

    /// 記錄一個樣本；達到通知間隔或完成時通知觀察者並回傳快照
    pub fn sample(&mut self, completed: u64, total: u64, now: Instant) -> Option<ProgressSnapshot> {
        if self.finished {
            return None;
        }

        let snapshot = self.compute(completed, total, now);
        let due = now.saturating_duration_since(self.last_emit_at) >= self.interval;
        if !snapshot.finished && !due {
            return None;
        }

        self.last_emit_at = now;
        self.last_emit_bytes = snapshot.completed;
        self.finished = snapshot.finished;
        self.observer.on_progress(&snapshot);

        Some(snapshot)
    }
}

fn per_second(bytes: u64, elapsed: Duration) -> Option<f64> {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        Some(bytes as f64 / seconds)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// 把收到的快照存起來的觀察者
    #[derive(Clone, Default)]
    struct Recorder {
        snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
    }

    impl ProgressObserver for Recorder {
        fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
            self.snapshots.lock().unwrap().push(snapshot.clone());
        }
    }

    fn tracker(mode: RateMode, start: Instant) -> (ProgressTracker, Recorder) {
        let recorder = Recorder::default();
        let tracker = ProgressTracker::new(
            "video.mp4",
            mode,
            DEFAULT_EMIT_INTERVAL,
            start,
            Box::new(recorder.clone()),
        );
        (tracker, recorder)
    }

    #[test]
    fn test_percent_is_monotonic() {
        let start = Instant::now();
        let (tracker, _) = tracker(RateMode::SinceStart, start);

        let mut previous = -1.0;
        for (i, completed) in [0_u64, 1, 250, 250, 999, 1000].into_iter().enumerate() {
            let now = start + Duration::from_millis(100 * (i as u64 + 1));
            let snapshot = tracker.compute(completed, 1000, now);
            assert!((snapshot.percent - completed as f64 / 10.0).abs() < 1e-9);
            assert!(snapshot.percent >= previous);
            previous = snapshot.percent;
        }
    }

    #[test]
    fn test_zero_total_reports_zero_percent() {
        let start = Instant::now();
        let (mut tracker, recorder) = tracker(RateMode::SinceStart, start);

        let snapshot = tracker.sample(0, 0, start).unwrap();
        assert_eq!(snapshot.percent, 0.0);
        assert!(snapshot.bytes_per_sec.is_none());
        assert!(snapshot.eta.is_none());
        assert_eq!(recorder.snapshots.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_emission_is_rate_limited() {
        let start = Instant::now();
        let (mut tracker, recorder) = tracker(RateMode::SinceStart, start);

        for step in 1..=9_u64 {
            tracker.sample(step * 10, 1000, start + Duration::from_millis(step * 200));
        }
        // 1.0s 與 1.8s 之間只會通知一次（1.0s）
        let emitted = recorder.snapshots.lock().unwrap().len();
        assert_eq!(emitted, 1);
    }

    #[test]
    fn test_final_sample_always_emitted_once() {
        let start = Instant::now();
        let (mut tracker, recorder) = tracker(RateMode::SinceStart, start);

        let snapshot = tracker
            .sample(1000, 1000, start + Duration::from_millis(10))
            .unwrap();
        assert!(snapshot.finished);
        assert!(tracker.is_finished());
        assert!(tracker.sample(1000, 1000, start + Duration::from_secs(5)).is_none());
        assert_eq!(recorder.snapshots.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_since_start_rate_and_eta() {
        let start = Instant::now();
        let (tracker, _) = tracker(RateMode::SinceStart, start);

        let snapshot = tracker.compute(500, 2000, start + Duration::from_secs(2));
        assert!((snapshot.bytes_per_sec.unwrap() - 250.0).abs() < 1e-9);
        assert_eq!(snapshot.eta, Some(Duration::from_secs(6)));
    }

    #[test]
    fn test_windowed_rate_uses_previous_emission() {
        let start = Instant::now();
        let (mut tracker, _) = tracker(RateMode::Windowed, start);

        let first = tracker
            .sample(400, 1000, start + Duration::from_secs(1))
            .unwrap();
        assert!((first.bytes_per_sec.unwrap() - 400.0).abs() < 1e-9);

        let second = tracker
            .sample(1000, 1000, start + Duration::from_secs(3))
            .unwrap();
        assert!((second.bytes_per_sec.unwrap() - 300.0).abs() < 1e-9);
        assert!(second.finished);
    }

    #[test]
    fn test_no_rate_without_elapsed_time() {
        let start = Instant::now();
        let (tracker, _) = tracker(RateMode::SinceStart, start);

        let snapshot = tracker.compute(10, 100, start);
        assert!(snapshot.bytes_per_sec.is_none());
        assert!(snapshot.eta.is_none());
    }
}
