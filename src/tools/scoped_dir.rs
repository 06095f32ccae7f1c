use crate::tools::path_validator::ensure_directory_exists;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 在 drop 時移除的暫存資料夾
///
/// 不論成功或失敗，離開作用域後資料夾一定被清除。
/// 已存在的資料夾不會被接管，`create` 回傳 `AlreadyExists`。
#[derive(Debug)]
pub struct ScopedDirectory {
    path: PathBuf,
}

impl ScopedDirectory {
    pub fn create(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            ensure_directory_exists(parent)?;
        }

        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder.create(&path)?;

        debug!("建立暫存資料夾: {}", path.display());
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedDirectory {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                warn!("無法清理暫存資料夾 {}: {e}", self.path.display());
            } else {
                debug!("已清理暫存資料夾: {}", self.path.display());
            }
        }
    }
}
