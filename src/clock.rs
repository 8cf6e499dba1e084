use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" as epoch seconds. Every date the scheduler stores or
/// compares is an epoch-second instant, so this is the only time surface
/// the services need.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}
