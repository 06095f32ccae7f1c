//! 預覽畫面擷取
//!
//! 在影片長度 1% ~ 95% 之間隨機選取時間點（避開片頭片尾黑畫面），
//! 每個時間點呼叫一次外部工具輸出一張圖片。

use crate::error::PipelineError;
use crate::tools::MediaTool;
use crate::tools::format::{format_timestamp, format_timestamp_for_filename};
use crate::tools::path_validator::ensure_directory_exists;
use log::{error, info};
use rand::Rng;
use std::path::{Path, PathBuf};

/// 預設預覽圖數量
pub const DEFAULT_PREVIEW_COUNT: usize = 4;

const WINDOW_START: f64 = 0.01;
const WINDOW_END: f64 = 0.95;

/// 在 `[0.01 * duration, 0.95 * duration]` 內均勻抽取時間點
pub fn draw_timestamp<R: Rng>(duration: f64, rng: &mut R) -> f64 {
    rng.random_range(duration * WINDOW_START..=duration * WINDOW_END)
}

/// 預覽圖檔名：`frame_{index}_{HH-MM-SS_mmm}.jpg`
#[must_use]
pub fn frame_file_name(index: usize, seconds: f64) -> String {
    format!("frame_{index}_{}.jpg", format_timestamp_for_filename(seconds))
}

/// 擷取 `count` 張隨機時間點的畫面到 `dest_dir`
///
/// 任一張失敗即中止並回傳錯誤，不回傳部分結果；
/// 已寫入的檔案由呼叫端的暫存資料夾負責清理。
pub fn extract_random_frames<R: Rng>(
    tool: &dyn MediaTool,
    video_path: &Path,
    duration_seconds: f64,
    count: usize,
    dest_dir: &Path,
    rng: &mut R,
) -> Result<Vec<PathBuf>, PipelineError> {
    ensure_directory_exists(dest_dir).map_err(|source| PipelineError::Directory {
        path: dest_dir.to_path_buf(),
        source,
    })?;

    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return Err(PipelineError::Extraction {
            path: video_path.to_path_buf(),
            index: 0,
            timestamp: duration_seconds.to_string(),
            source: anyhow::anyhow!("影片長度無效: {duration_seconds}"),
        });
    }

    info!("畫面輸出資料夾: {}", dest_dir.display());

    let mut frames = Vec::with_capacity(count);
    for index in 0..count {
        let seconds = draw_timestamp(duration_seconds, rng);
        let timestamp = format_timestamp(seconds);
        let output = dest_dir.join(frame_file_name(index, seconds));

        if let Err(e) = tool.extract_frame(video_path, &timestamp, &output) {
            error!("擷取第 {index} 張畫面失敗 ({timestamp}): {e:#}");
            return Err(PipelineError::Extraction {
                path: video_path.to_path_buf(),
                index,
                timestamp,
                source: e,
            });
        }

        info!("已擷取畫面 {}/{count} @ {timestamp}", index + 1);
        frames.push(output);
    }

    Ok(frames)
}
