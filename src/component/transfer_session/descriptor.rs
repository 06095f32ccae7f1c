use crate::error::PipelineError;
use anyhow::anyhow;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static REGEX_MAGNET_TOPIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[?&])xt=urn:(?:btih:(?:[0-9a-f]{40}|[a-z2-7]{32})|btmh:1220[0-9a-f]{64})(?:&|$)")
        .expect("Invalid regex")
});

static REGEX_TORRENT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://\S+\.torrent(?:[?#]\S*)?$").expect("Invalid regex"));

/// 分散式傳輸資源的識別字串（magnet URI 或 .torrent URL）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDescriptor(String);

impl TransferDescriptor {
    /// 驗證並建立 descriptor
    pub fn parse(input: &str) -> Result<Self, PipelineError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(PipelineError::descriptor(trimmed, anyhow!("descriptor 為空")));
        }

        if trimmed.get(..8).is_some_and(|p| p.eq_ignore_ascii_case("magnet:?")) {
            if REGEX_MAGNET_TOPIC.is_match(trimmed) {
                return Ok(Self(trimmed.to_string()));
            }
            return Err(PipelineError::descriptor(
                trimmed,
                anyhow!("magnet 缺少有效的 xt=urn:btih / urn:btmh"),
            ));
        }

        if REGEX_TORRENT_URL.is_match(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }

        Err(PipelineError::descriptor(
            trimmed,
            anyhow!("不支援的 descriptor 格式"),
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
