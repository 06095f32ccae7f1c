use log::debug;

/// 執行環境是否具備擷取畫面的能力
pub trait ExtractionCapability: Send + Sync {
    fn available(&self) -> bool;
}

/// 以 PATH 中是否有 ffmpeg 判斷，每次呼叫都重新查詢
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegAvailability;

impl ExtractionCapability for FfmpegAvailability {
    fn available(&self) -> bool {
        match which::which("ffmpeg") {
            Ok(path) => {
                debug!("找到 ffmpeg: {}", path.display());
                true
            }
            Err(e) => {
                debug!("找不到 ffmpeg: {e}");
                false
            }
        }
    }
}

/// 固定回傳值，用於強制走指定路徑
#[derive(Debug, Clone, Copy)]
pub struct FixedCapability(pub bool);

impl ExtractionCapability for FixedCapability {
    fn available(&self) -> bool {
        self.0
    }
}
