//! 訊息平台協作者介面

use crate::tools::ProgressTracker;
use anyhow::Result;
use std::path::Path;
use std::time::Duration;

/// 一部要發送的影片
#[derive(Debug)]
pub struct VideoDocument<U> {
    pub file: U,
    /// 以斜體顯示的說明文字
    pub caption: String,
    pub mime: String,
    pub thumbnail: Option<U>,
    pub duration: Option<Duration>,
    /// (寬, 高)
    pub resolution: Option<(u32, u32)>,
    pub supports_streaming: bool,
}

impl<U> VideoDocument<U> {
    /// 只帶 MIME 的影片
    pub fn bare(file: U, caption: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            file,
            caption: caption.into(),
            mime: mime.into(),
            thumbnail: None,
            duration: None,
            resolution: None,
            supports_streaming: true,
        }
    }
}

#[derive(Debug)]
pub enum OutgoingMedia<U> {
    Video(VideoDocument<U>),
    Photo(U),
}

/// 訊息平台 client
///
/// 實作必須可在連線執行緒與管線執行緒之間共用。
pub trait Messenger: Send + Sync {
    /// 解析後的頻道
    type Target;
    /// 已上傳（或已暫存待送出）的檔案
    type Upload;

    /// 建立連線並驗證身分
    fn connect(&self) -> Result<()>;

    fn disconnect(&self);

    fn resolve(&self, channel: &str) -> Result<Self::Target>;

    /// 上傳檔案，進度透過 tracker 回報
    fn upload_from_path(
        &self,
        path: &Path,
        tracker: ProgressTracker,
        part_size: usize,
    ) -> Result<Self::Upload>;

    fn send_media(&self, target: &Self::Target, media: OutgoingMedia<Self::Upload>) -> Result<()>;

    fn send_album(
        &self,
        target: &Self::Target,
        first: Self::Upload,
        rest: Vec<Self::Upload>,
    ) -> Result<()>;
}
