//! 功能元件模組
//!
//! 每個子模組實現管線中的一段，包含主要邏輯和專用工具

pub mod pipeline_driver;
pub mod publish_session;
pub mod transfer_session;

pub use pipeline_driver::{DescriptorSource, DescriptorSummary, PipelineDriver};
pub use publish_session::{ConnectionHolder, Messenger, PublishOutcome, PublishSession};
pub use transfer_session::{TransferClient, TransferDescriptor, TransferHandle, TransferSession};
