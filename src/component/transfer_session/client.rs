//! 分散式傳輸協作者介面
//!
//! 傳輸協定本身（peer 探索、piece 選擇）不在本 crate 範圍內，
//! 只透過以下介面取用。

use super::descriptor::TransferDescriptor;
use anyhow::Result;
use std::path::PathBuf;

/// piece 優先順序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiecePriority {
    Normal,
    High,
}

/// 傳輸中的單一檔案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// 在傳輸內的順序
    pub index: usize,
    /// 相對於下載根目錄的路徑
    pub path: PathBuf,
    /// 宣告長度（位元組）
    pub length: u64,
}

impl FileEntry {
    /// 顯示用名稱
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.to_string_lossy().into_owned(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

pub trait TransferClient: Send + Sync {
    type Handle: TransferHandle;

    /// 加入傳輸，尚未取得 metadata
    fn add_by_descriptor(&self, descriptor: &TransferDescriptor) -> Result<Self::Handle>;
}

/// 一個進行中的傳輸
pub trait TransferHandle {
    /// 阻塞直到 metadata 解析完成
    fn await_metadata(&mut self) -> Result<()>;

    fn name(&self) -> &str;

    fn total_length(&self) -> u64;

    /// 依傳輸順序排列的檔案
    fn files(&self) -> &[FileEntry];

    fn set_priority(&self, file: &FileEntry, priority: PiecePriority) -> Result<()>;

    /// 已完成位元組數，單調遞增直到等於檔案長度
    fn bytes_completed(&self, file: &FileEntry) -> Result<u64>;

    /// 結束傳輸（保留已下載的資料）
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_uses_file_name() {
        let entry = FileEntry {
            index: 0,
            path: PathBuf::from("Show S01/episode 01.mkv"),
            length: 10,
        };
        assert_eq!(entry.display_name(), "episode 01.mkv");
    }
}
