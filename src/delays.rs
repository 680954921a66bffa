use std::time::Duration;

use log::info;
use rand::Rng;
use tokio::time::sleep;

/// Inclusive range of whole seconds to wait between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl DelayRange {
    pub const fn new(min_secs: u64, max_secs: u64) -> Self {
        Self { min_secs, max_secs }
    }

    pub fn sample(&self) -> Duration {
        if self.max_secs <= self.min_secs {
            return Duration::from_secs(self.min_secs);
        }
        let mut rng = rand::thread_rng();
        Duration::from_secs(rng.gen_range(self.min_secs..=self.max_secs))
    }
}

pub async fn random_delay(range: DelayRange, reason: &str) -> Duration {
    let delay = range.sample();
    info!("Waiting for {} seconds ({reason})...", delay.as_secs());
    sleep(delay).await;
    delay
}

pub async fn fixed_delay(delay: Duration, reason: &str) {
    info!("Waiting for {} seconds ({reason})...", delay.as_secs());
    sleep(delay).await;
}
