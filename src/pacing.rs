use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-gap gate between successive outbound calls.
/// - First call always passes immediately.
/// - Later calls wait until `min_gap` has elapsed since the previous one.
#[derive(Debug)]
pub struct Pacer {
    min_gap: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last: Mutex::new(None),
        }
    }

    /// How long a call at `now` still has to wait. Does NOT mutate state.
    pub fn delay_at(&self, last: Option<Instant>, now: Instant) -> Duration {
        match last {
            None => Duration::ZERO,
            Some(prev) => self.min_gap.saturating_sub(now.saturating_duration_since(prev)),
        }
    }

    /// Sleep if needed, then claim the slot.
    pub async fn wait_turn(&self) {
        let mut last = self.last.lock().await;
        let delay = self.delay_at(*last, Instant::now());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        *last = Some(Instant::now());
    }
}
