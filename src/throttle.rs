use std::time::Duration;

use rand::Rng;

/// Randomized pause between page requests for one keyword.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    min_secs: u64,
    max_secs: u64,
}

impl Throttle {
    /// Whole-second delays drawn uniformly from `min_secs..=max_secs`.
    /// Bounds given in the wrong order are swapped.
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs: min_secs.min(max_secs),
            max_secs: min_secs.max(max_secs),
        }
    }

    /// A throttle that never sleeps.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn next_delay(&self) -> Duration {
        let mut rng = rand::thread_rng();
        Duration::from_secs(rng.gen_range(self.min_secs..=self.max_secs))
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        tracing::info!("waiting {} seconds before next page", delay.as_secs());
        tokio::time::sleep(delay).await;
    }
}
