use crate::tools::format::{bytes_to_mb, format_duration};
use crate::tools::progress_tracker::{ProgressObserver, ProgressReporter, ProgressSnapshot};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

/// 進度顯示方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressDisplay {
    /// 終端機單行進度條
    Console,
    /// 寫入日誌
    Log,
    Silent,
}

impl ProgressDisplay {
    /// 終端機時使用進度條，否則寫入日誌
    #[must_use]
    pub fn detect() -> Self {
        if console::Term::stdout().is_term() {
            Self::Console
        } else {
            Self::Log
        }
    }
}

impl ProgressReporter for ProgressDisplay {
    fn observer(&self, label: &str) -> Box<dyn ProgressObserver> {
        match self {
            Self::Console => Box::new(ConsoleObserver::new(label)),
            Self::Log => Box::new(LogObserver),
            Self::Silent => Box::new(SilentObserver),
        }
    }
}

/// 速度與剩餘時間的說明文字
#[must_use]
pub fn describe_rate(snapshot: &ProgressSnapshot) -> String {
    let speed = snapshot
        .bytes_per_sec
        .map_or_else(|| "--".to_string(), |rate| format!("{:.2} MB/s", rate / 1024.0 / 1024.0));
    let eta = snapshot
        .eta
        .map_or_else(|| "--".to_string(), format_duration);
    format!("Speed: {speed} | ETA: {eta}")
}

struct ConsoleObserver {
    label: String,
    bar: Option<ProgressBar>,
}

impl ConsoleObserver {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            bar: None,
        }
    }

    fn bar_for(&mut self, total: u64) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{prefix} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                    .expect("Invalid progress bar template")
                    .progress_chars("#>-"),
            );
            bar.set_prefix(self.label.clone());
            bar
        })
    }
}

impl ProgressObserver for ConsoleObserver {
    fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        let message = format!("{:.2}% | {}", snapshot.percent, describe_rate(snapshot));
        let bar = self.bar_for(snapshot.total);
        bar.set_position(snapshot.completed);
        bar.set_message(message);
        if snapshot.finished {
            bar.finish();
        }
    }
}

struct LogObserver;

impl ProgressObserver for LogObserver {
    fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        info!(
            "{}: {:.2}% ({:.2}/{:.2} MB) | {} | 經過 {}",
            snapshot.label,
            snapshot.percent,
            bytes_to_mb(snapshot.completed),
            bytes_to_mb(snapshot.total),
            describe_rate(snapshot),
            format_duration(snapshot.elapsed)
        );
    }
}

struct SilentObserver;

impl ProgressObserver for SilentObserver {
    fn on_progress(&mut self, _snapshot: &ProgressSnapshot) {}
}
