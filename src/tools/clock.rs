use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// 時間來源，輪詢迴圈透過它取得現在時間與等待
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// 手動推進的時鐘，`sleep` 只推進內部時間不實際等待
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Instant>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        if let Ok(mut current) = self.current.lock() {
            *current += duration;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.current
            .lock()
            .map_or_else(|poisoned| *poisoned.into_inner(), |current| *current)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
