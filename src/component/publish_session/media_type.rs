use std::path::Path;

const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// 依副檔名推斷影片 MIME，未知時為 `video/mp4`
#[must_use]
pub fn video_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("m4v") => "video/x-m4v",
        Some("ts" | "m2ts") => "video/mp2t",
        Some("flv") => "video/x-flv",
        Some("wmv") => "video/x-ms-wmv",
        Some("mpg" | "mpeg") => "video/mpeg",
        Some("3gp") => "video/3gpp",
        _ => DEFAULT_VIDEO_MIME,
    }
}
