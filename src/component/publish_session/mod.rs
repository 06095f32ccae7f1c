//! 發布元件
//!
//! 維持訊息平台連線，將下載完成的影片（與預覽圖）送到頻道

mod connection;
mod main;
mod media_type;
mod messenger;
mod progress_reader;
mod telegram;

pub use connection::ConnectionHolder;
pub use main::{PublishOutcome, PublishSession, PublishState, Retention, preview_directory};
pub use media_type::video_mime;
pub use messenger::{Messenger, OutgoingMedia, VideoDocument};
pub use progress_reader::ProgressReader;
pub use telegram::{ChatTarget, StagedUpload, TelegramBot};
