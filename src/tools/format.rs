use std::time::Duration;

const MIB: f64 = 1024.0 * 1024.0;

#[must_use]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / MIB
}

/// 將時間格式化為 `1m30s` / `45s`
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs_f64().round() as u64;
    let minutes = total / 60;
    let seconds = total % 60;
    if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// 將秒數格式化為 ffmpeg 可用的 `HH:MM:SS.mmm`
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_seconds(seconds);
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// 檔名安全的時間字串 `HH-MM-SS_mmm`
#[must_use]
pub fn format_timestamp_for_filename(seconds: f64) -> String {
    let (h, m, s, ms) = split_seconds(seconds);
    format!("{h:02}-{m:02}-{s:02}_{ms:03}")
}

fn split_seconds(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60, ms)
}
