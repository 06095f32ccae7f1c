//! 分散式傳輸元件
//!
//! 加入 descriptor、等待 metadata、逐檔等待下載完成

mod client;
mod descriptor;
mod main;
mod transmission;

pub use client::{FileEntry, PiecePriority, TransferClient, TransferHandle};
pub use descriptor::TransferDescriptor;
pub use main::TransferSession;
pub use transmission::{TransmissionClient, TransmissionTorrent};
