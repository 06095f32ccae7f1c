pub mod load;
pub mod types;

pub use types::{
    Config, DEFAULT_CONFIG_FILE, DEFAULT_PROFILE, MAX_PREVIEW_COUNT, PipelineSettings,
    TelegramProfile, TransmissionSettings,
};
