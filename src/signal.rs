use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// 安裝 Ctrl-C 處理器，回傳兩個工作共用的中斷旗標
pub fn setup_shutdown_signal() -> Result<Arc<AtomicBool>> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，正在安全關閉...");
    })
    .context("無法設定 Ctrl-C 處理器")?;

    Ok(shutdown_signal)
}

/// 阻塞直到中斷旗標被設定
pub fn idle_until_shutdown(shutdown_signal: &AtomicBool, tick: Duration) {
    while !shutdown_signal.load(Ordering::SeqCst) {
        thread::sleep(tick);
    }
}
