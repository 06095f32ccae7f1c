use crate::config::types::{Config, MAX_PREVIEW_COUNT, PipelineSettings, TelegramProfile};
use crate::error::PipelineError;
use std::fs;
use std::path::Path;
use std::time::Duration;

impl Config {
    /// 從 JSON 設定檔載入
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("Failed to read config from {}: {e}", path.display()))
        })?;

        Self::from_json(&content).map_err(|e| match e {
            PipelineError::Config { message } => {
                PipelineError::config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| PipelineError::config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.upload_part_size == 0 {
            return Err(PipelineError::config("upload_part_size 必須大於 0"));
        }
        if self.preview_count > MAX_PREVIEW_COUNT {
            return Err(PipelineError::config(format!(
                "preview_count 不可超過 {MAX_PREVIEW_COUNT}"
            )));
        }
        if self.progress_interval_ms == 0 || self.poll_interval_ms == 0 {
            return Err(PipelineError::config("progress/poll interval 必須大於 0"));
        }
        Ok(())
    }

    /// 依名稱取得 profile
    #[must_use]
    pub fn profile_by_name(&self, name: &str) -> Option<&TelegramProfile> {
        self.telegram.iter().find(|p| p.name == name)
    }

    /// 取得 profile 並組合成管線設定
    pub fn pipeline_settings(
        &self,
        profile_name: &str,
    ) -> Result<(TelegramProfile, PipelineSettings), PipelineError> {
        let profile = self
            .profile_by_name(profile_name)
            .cloned()
            .ok_or_else(|| PipelineError::config(format!("找不到 profile: {profile_name}")))?;

        if profile.bot_token.trim().is_empty() {
            return Err(PipelineError::config(format!(
                "profile {profile_name} 缺少 bot_token"
            )));
        }
        if profile.channel_id.trim().is_empty() {
            return Err(PipelineError::config(format!(
                "profile {profile_name} 缺少 channel_id"
            )));
        }

        let download_root = profile
            .download_path
            .clone()
            .unwrap_or_else(|| self.download_path.clone());

        let settings = PipelineSettings {
            channel_id: profile.channel_id.clone(),
            download_root,
            delete_after_upload: self.delete_after_upload,
            preview_count: self.preview_count,
            progress_interval: Duration::from_millis(self.progress_interval_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            upload_part_size: self.upload_part_size,
        };

        Ok((profile, settings))
    }
}
