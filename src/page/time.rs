use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock source for time-dependent behaviors.
pub trait TimeProvider: Send + Sync {
    fn now_millis(&self) -> i64;
}

// --- Real implementation ---

#[derive(Debug, Default)]
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

// --- Fake implementation ---

#[derive(Debug)]
pub struct FakeTimeProvider {
    pub fixed_millis: i64,
}

impl FakeTimeProvider {
    pub fn new(fixed_millis: i64) -> Self {
        Self { fixed_millis }
    }
}

impl TimeProvider for FakeTimeProvider {
    fn now_millis(&self) -> i64 {
        self.fixed_millis
    }
}
