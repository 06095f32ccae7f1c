//! 管線錯誤分類
//!
//! 每個錯誤都帶有產生它的操作與路徑（或識別字串），
//! 由 driver 記錄後繼續下一個檔案或下一個 descriptor。

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// 啟動階段的設定錯誤（致命）
    #[error("設定錯誤: {message}")]
    Config { message: String },

    /// descriptor 格式錯誤或無法解析
    #[error("無法處理 descriptor {descriptor}: {source:#}")]
    Descriptor {
        descriptor: String,
        source: anyhow::Error,
    },

    /// 等待檔案下載時輪詢失敗
    #[error("傳輸輪詢失敗 {}: {source:#}", path.display())]
    Transfer {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("檔案不存在: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("探測媒體資訊失敗 {}: {source:#}", path.display())]
    Probe {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("擷取第 {index} 張畫面失敗 {} @ {timestamp}: {source:#}", path.display())]
    Extraction {
        path: PathBuf,
        index: usize,
        timestamp: String,
        source: anyhow::Error,
    },

    #[error("無法建立資料夾 {}: {source}", path.display())]
    Directory { path: PathBuf, source: io::Error },

    #[error("上傳失敗 {}: {source:#}", path.display())]
    Upload {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("發送失敗 {}: {source:#}", path.display())]
    Send {
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("操作已取消")]
    Cancelled,
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn descriptor(descriptor: &str, source: anyhow::Error) -> Self {
        Self::Descriptor {
            descriptor: descriptor.to_string(),
            source,
        }
    }

    pub fn probe(path: &Path, source: anyhow::Error) -> Self {
        Self::Probe {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn upload(path: &Path, source: anyhow::Error) -> Self {
        Self::Upload {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn send(path: &Path, source: anyhow::Error) -> Self {
        Self::Send {
            path: path.to_path_buf(),
            source,
        }
    }

    /// 錯誤種類的簡短名稱，用於摘要與日誌
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Descriptor { .. } => "descriptor",
            Self::Transfer { .. } => "transfer",
            Self::FileNotFound { .. } => "file_not_found",
            Self::Probe { .. } => "probe",
            Self::Extraction { .. } => "extraction",
            Self::Directory { .. } => "directory",
            Self::Upload { .. } => "upload",
            Self::Send { .. } => "send",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path_and_cause() {
        let err = PipelineError::probe(
            Path::new("/downloads/a.mkv"),
            anyhow::anyhow!("ffprobe 執行失敗"),
        );
        let message = err.to_string();
        assert!(message.contains("/downloads/a.mkv"));
        assert!(message.contains("ffprobe 執行失敗"));
        assert_eq!(err.kind(), "probe");
    }

    #[test]
    fn test_extraction_reports_index_and_timestamp() {
        let err = PipelineError::Extraction {
            path: PathBuf::from("v.mp4"),
            index: 2,
            timestamp: "00:01:02.345".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        let message = err.to_string();
        assert!(message.contains("第 2 張"));
        assert!(message.contains("00:01:02.345"));
    }
}
