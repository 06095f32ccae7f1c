//! 管線主迴圈
//!
//! 讀取 descriptor → 下載 → 每個檔案完成後立即發布 → 回到輸入。
//! 單一檔案或 descriptor 的失敗只記錄，不會中止迴圈。

use super::operator_input::DescriptorSource;
use crate::component::publish_session::{Messenger, PublishOutcome, PublishSession, Retention};
use crate::component::transfer_session::{
    TransferClient, TransferDescriptor, TransferHandle, TransferSession,
};
use crate::error::PipelineError;
use console::style;
use log::{error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 單一 descriptor 的處理統計
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DescriptorSummary {
    pub name: String,
    pub files: usize,
    pub sent: usize,
    pub deleted: usize,
    pub failed: usize,
    pub warnings: usize,
    pub cancelled: bool,
}

impl DescriptorSummary {
    fn new(name: &str, files: usize) -> Self {
        Self {
            name: name.to_string(),
            files,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: &PublishOutcome) {
        self.warnings += outcome.warnings.len();
        match &outcome.result {
            Ok(Retention::Deleted) => {
                self.sent += 1;
                self.deleted += 1;
            }
            Ok(Retention::Retained) => self.sent += 1,
            Err(_) => self.failed += 1,
        }
    }
}

pub struct PipelineDriver<C: TransferClient, M: Messenger> {
    transfer: TransferSession<C>,
    publisher: PublishSession<M>,
    shutdown_signal: Arc<AtomicBool>,
}

impl<C: TransferClient, M: Messenger> PipelineDriver<C, M> {
    pub const fn new(
        transfer: TransferSession<C>,
        publisher: PublishSession<M>,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transfer,
            publisher,
            shutdown_signal,
        }
    }

    /// 持續讀取 descriptor，直到輸入結束或收到中斷信號
    pub fn run(&mut self, source: &mut dyn DescriptorSource) -> Vec<DescriptorSummary> {
        let mut summaries = Vec::new();

        loop {
            if self.is_shutdown() {
                info!("收到中斷信號，結束主迴圈");
                break;
            }

            let Some(line) = source.next_descriptor() else {
                info!("輸入結束");
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.process_descriptor(line) {
                Ok(summary) => {
                    display_summary(&summary);
                    summaries.push(summary);
                }
                Err(e) => {
                    error!("descriptor 處理失敗 [{}]: {e}", e.kind());
                    eprintln!("{} {}", style("錯誤:").red().bold(), e);
                }
            }
        }

        summaries
    }

    /// 下載並發布一個 descriptor 的所有檔案
    pub fn process_descriptor(&mut self, input: &str) -> Result<DescriptorSummary, PipelineError> {
        let descriptor = TransferDescriptor::parse(input)?;
        let handle = self.transfer.submit(&descriptor)?;

        let files = handle.files().to_vec();
        let mut summary = DescriptorSummary::new(handle.name(), files.len());
        println!(
            "{}",
            style(format!("=== {} ({} 個檔案) ===", summary.name, summary.files))
                .cyan()
                .bold()
        );

        for file in &files {
            if self.is_shutdown() {
                summary.cancelled = true;
                break;
            }

            match self.transfer.await_file(&handle, file) {
                Ok(()) => {}
                Err(PipelineError::Cancelled) => {
                    summary.cancelled = true;
                    break;
                }
                Err(e) => {
                    warn!("略過檔案 [{}]: {e}", e.kind());
                    summary.failed += 1;
                    continue;
                }
            }

            let outcome = self.publisher.publish(&file.path);
            summary.record(&outcome);
        }

        self.transfer.close(handle);
        Ok(summary)
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown_signal.load(Ordering::SeqCst)
    }
}

fn display_summary(summary: &DescriptorSummary) {
    println!();
    println!(
        "{}",
        style(format!("=== {} 處理結果 ===", summary.name))
            .cyan()
            .bold()
    );
    println!("  發布: {} / {} 個", style(summary.sent).green(), summary.files);
    if summary.deleted > 0 {
        println!("  已刪除: {} 個", style(summary.deleted).dim());
    }
    if summary.failed > 0 {
        println!("  失敗: {} 個", style(summary.failed).red());
    }
    if summary.warnings > 0 {
        println!("  警告: {} 則", style(summary.warnings).yellow());
    }
    if summary.cancelled {
        println!("{}", style("操作已中斷").yellow());
    }
}
