//! 管線驅動元件

mod main;
mod operator_input;

pub use main::{DescriptorSummary, PipelineDriver};
pub use operator_input::{DescriptorSource, LineSource, PromptSource, QueuedSource};
