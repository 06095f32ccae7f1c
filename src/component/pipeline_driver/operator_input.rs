use dialoguer::Input;
use log::warn;
use std::collections::VecDeque;
use std::io::{self, BufRead};

/// descriptor 來源，每次回傳一行
pub trait DescriptorSource {
    /// 輸入結束時回傳 `None`
    fn next_descriptor(&mut self) -> Option<String>;
}

/// 互動式輸入
#[derive(Debug, Default)]
pub struct PromptSource;

impl DescriptorSource for PromptSource {
    fn next_descriptor(&mut self) -> Option<String> {
        let input = Input::<String>::new()
            .with_prompt("請輸入 magnet 連結")
            .allow_empty(true)
            .interact_text();

        match input {
            Ok(line) => Some(line),
            Err(e) => {
                warn!("讀取輸入失敗: {e}");
                None
            }
        }
    }
}

/// 從非互動輸入（管線或檔案）逐行讀取
pub struct LineSource<R> {
    reader: R,
}

impl LineSource<io::StdinLock<'static>> {
    #[must_use]
    pub fn stdin() -> Self {
        Self {
            reader: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> LineSource<R> {
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> DescriptorSource for LineSource<R> {
    fn next_descriptor(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                warn!("讀取輸入失敗: {e}");
                None
            }
        }
    }
}

/// 預先準備好的 descriptor 清單
#[derive(Debug, Default)]
pub struct QueuedSource {
    queue: VecDeque<String>,
}

impl QueuedSource {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: items.into_iter().map(Into::into).collect(),
        }
    }
}

impl DescriptorSource for QueuedSource {
    fn next_descriptor(&mut self) -> Option<String> {
        self.queue.pop_front()
    }
}
