use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Something that can pause the current task. Swapped for a recorder in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-delay request pacing: the first call goes through immediately,
/// every later call waits `delay` first.
pub struct Throttle {
    delay: Duration,
    sleeper: Box<dyn Sleeper>,
    primed: bool,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self::with_sleeper(delay, Box::new(TokioSleeper))
    }

    pub fn with_sleeper(delay: Duration, sleeper: Box<dyn Sleeper>) -> Self {
        Self {
            delay,
            sleeper,
            primed: false,
        }
    }

    /// Call right before issuing a request.
    pub async fn wait(&mut self) {
        if self.primed && !self.delay.is_zero() {
            debug!(delay_ms = self.delay.as_millis() as u64, "throttling next request");
            self.sleeper.sleep(self.delay).await;
        }
        self.primed = true;
    }
}
