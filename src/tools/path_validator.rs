use anyhow::{Result, bail};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_file() {
        bail!("路徑不是檔案: {}", path.display());
    }
    Ok(())
}

/// 建立資料夾（含上層），Unix 上權限為 0755
pub fn ensure_directory_exists(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

/// 建立資料夾並回傳其絕對路徑
pub fn resolve_directory(path: &Path) -> io::Result<PathBuf> {
    ensure_directory_exists(path)?;
    fs::canonicalize(path)
}
