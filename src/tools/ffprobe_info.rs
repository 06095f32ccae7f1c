use crate::error::PipelineError;
use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

/// 外部媒體工具（探測與擷取單張畫面）
pub trait MediaTool: Send + Sync {
    /// 回傳工具輸出的 JSON 媒體資訊
    fn probe(&self, path: &Path) -> Result<String>;

    /// 在指定時間點擷取一張圖片到 `output`
    fn extract_frame(&self, path: &Path, timestamp: &str, output: &Path) -> Result<()>;
}

/// 使用系統上的 ffprobe / ffmpeg
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegTool;

impl MediaTool for FfmpegTool {
    fn probe(&self, path: &Path) -> Result<String> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffprobe 執行失敗: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn extract_frame(&self, path: &Path, timestamp: &str, output: &Path) -> Result<()> {
        let result = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-ss", timestamp, "-i"])
            .arg(path)
            .args(["-frames:v", "1", "-update", "1", "-q:v", "2", "-y"])
            .arg(output)
            .output()
            .with_context(|| format!("無法執行 ffmpeg 擷取畫面: {}", path.display()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            bail!("ffmpeg 擷取畫面失敗: {}", stderr.trim());
        }

        if !output.exists() {
            bail!("畫面檔案未建立: {}", output.display());
        }

        Ok(())
    }
}

/// 探測結果原始欄位（字串形式，與工具輸出一致）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub duration: String,
    pub width: String,
    pub height: String,
}

/// 正規化後的媒體資訊；寬高未知時為 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaMetadata {
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
}

impl MediaMetadata {
    #[must_use]
    pub const fn has_resolution(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl TryFrom<&ProbeReport> for MediaMetadata {
    type Error = anyhow::Error;

    fn try_from(report: &ProbeReport) -> Result<Self> {
        let duration_seconds: f64 = report
            .duration
            .trim()
            .parse()
            .with_context(|| format!("無法取得影片長度: {:?}", report.duration))?;
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            bail!("影片長度無效: {duration_seconds}");
        }

        Ok(Self {
            duration_seconds,
            width: report.width.trim().parse().unwrap_or(0),
            height: report.height.trim().parse().unwrap_or(0),
        })
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// 解析 ffprobe JSON
///
/// 寬高取自第一個視訊串流，長度取自容器層級的 `format.duration`。
/// 沒有視訊串流時寬高為空字串。
pub fn parse_probe_output(json: &str) -> Result<ProbeReport> {
    let probe: FfprobeOutput = serde_json::from_str(json).context("無法解析 ffprobe 輸出")?;

    let video_stream = probe.streams.as_ref().and_then(|streams| {
        streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    });

    let (width, height) = video_stream.map_or_else(
        || (String::new(), String::new()),
        |stream| {
            (
                stream.width.map(|w| w.to_string()).unwrap_or_default(),
                stream.height.map(|h| h.to_string()).unwrap_or_default(),
            )
        },
    );

    let duration = probe
        .format
        .and_then(|f| f.duration)
        .unwrap_or_default();

    Ok(ProbeReport {
        duration,
        width,
        height,
    })
}

/// 探測媒體並轉為 [`MediaMetadata`]
pub fn probe_media(tool: &dyn MediaTool, path: &Path) -> Result<MediaMetadata, PipelineError> {
    info!("探測影片資訊: {}", path.display());

    let metadata = tool
        .probe(path)
        .and_then(|json| parse_probe_output(&json))
        .and_then(|report| {
            debug!(
                "ffprobe 結果: duration={:?}, width={:?}, height={:?}",
                report.duration, report.width, report.height
            );
            MediaMetadata::try_from(&report)
        })
        .map_err(|e| PipelineError::probe(path, e))?;

    if !metadata.has_resolution() {
        info!("無法取得解析度，視為未知: {}", path.display());
    }

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"codec_type": "audio"},
            {"codec_type": "video", "width": 1920, "height": 1080},
            {"codec_type": "video", "width": 320, "height": 240}
        ],
        "format": {"duration": "125.480000"}
    }"#;

    struct JsonTool(&'static str);

    impl MediaTool for JsonTool {
        fn probe(&self, _path: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn extract_frame(&self, _path: &Path, _timestamp: &str, _output: &Path) -> Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn test_parse_selects_first_video_stream() {
        let report = parse_probe_output(SAMPLE).unwrap();
        assert_eq!(report.width, "1920");
        assert_eq!(report.height, "1080");
        assert_eq!(report.duration, "125.480000");
    }

    #[test]
    fn test_parse_without_video_stream() {
        let report =
            parse_probe_output(r#"{"streams":[{"codec_type":"audio"}],"format":{"duration":"3.5"}}"#)
                .unwrap();
        assert!(report.width.is_empty());
        assert!(report.height.is_empty());

        let metadata = MediaMetadata::try_from(&report).unwrap();
        assert!((metadata.duration_seconds - 3.5).abs() < f64::EPSILON);
        assert_eq!((metadata.width, metadata.height), (0, 0));
        assert!(!metadata.has_resolution());
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(parse_probe_output("not json").is_err());
    }

    #[test]
    fn test_missing_duration_is_error() {
        let report = parse_probe_output(r#"{"streams":[]}"#).unwrap();
        assert!(MediaMetadata::try_from(&report).is_err());
    }

    #[test]
    fn test_probe_media() {
        let metadata = probe_media(&JsonTool(SAMPLE), Path::new("a.mp4")).unwrap();
        assert!((metadata.duration_seconds - 125.48).abs() < 1e-9);
        assert_eq!((metadata.width, metadata.height), (1920, 1080));
    }

    #[test]
    fn test_probe_media_wraps_error() {
        let err = probe_media(&JsonTool("{"), Path::new("a.mp4")).unwrap_err();
        assert!(matches!(err, PipelineError::Probe { .. }));
    }
}
