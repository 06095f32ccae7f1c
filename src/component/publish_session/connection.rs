use super::messenger::Messenger;
use crate::signal::idle_until_shutdown;
use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const IDLE_TICK: Duration = Duration::from_millis(200);

/// 常駐連線工作
///
/// 在獨立執行緒上連線一次、回報就緒，之後維持到中斷旗標被設定才斷線。
pub struct ConnectionHolder {
    ready: Receiver<Result<()>>,
    handle: JoinHandle<()>,
}

impl ConnectionHolder {
    pub fn spawn<M>(messenger: Arc<M>, shutdown_signal: Arc<AtomicBool>) -> Result<Self>
    where
        M: Messenger + 'static,
    {
        let (ready_tx, ready) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("connection".to_string())
            .spawn(move || {
                info!("連線到訊息平台...");
                if let Err(e) = messenger.connect() {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
                let _ = ready_tx.send(Ok(()));

                idle_until_shutdown(&shutdown_signal, IDLE_TICK);
                messenger.disconnect();
            })
            .context("無法建立連線執行緒")?;

        Ok(Self { ready, handle })
    }

    /// 等待連線完成；失敗時回傳連線錯誤
    pub fn wait_ready(&self) -> Result<()> {
        self.ready
            .recv()
            .map_err(|_| anyhow!("連線執行緒在就緒前結束"))?
            .context("無法連線到訊息平台")
    }

    /// 等待執行緒結束，呼叫前應已設定中斷旗標
    pub fn join(self) {
        if self.handle.join().is_err() {
            warn!("連線執行緒異常結束");
        }
    }
}
