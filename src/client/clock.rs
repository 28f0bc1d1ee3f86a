use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Источник score для индекса id: микросекунды от Unix-эпохи, строго
/// возрастающие в пределах одного экземпляра.
#[derive(Debug, Default)]
pub struct ScoreClock {
    last: AtomicU64,
}

impl ScoreClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Следующий score: `max(now, last + 1)`.
    pub fn next(&self) -> f64 {
        let now = now_micros();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate as f64,
                Err(actual) => last = actual,
            }
        }
    }
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
