//! Bounded fixed-interval polling.
//!
//! The web-scraping providers submit text to a public translator page and
//! then re-probe the rendered result node until it shows something, so the
//! wait loop needs a hard attempt budget rather than open-ended backoff.

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct PollConfig {
    /// Maximum number of probe attempts before giving up.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub interval: Duration,
}

impl PollConfig {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Budget the scraping providers wait for a rendered translation.
    pub fn scrape_default() -> Self {
        Self {
            max_attempts: 100,
            interval: Duration::from_millis(100),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::scrape_default()
    }
}

/// Run `probe` until it yields a value or the attempt budget runs out.
/// The probe is the sole completion path: the loop returns exactly once, so
/// a satisfied probe and an exhausted budget can never both signal.
pub async fn poll_until<F, T, Fut>(config: &PollConfig, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Option<T>>,
{
    for attempt in 1..=config.max_attempts {
        if let Some(value) = probe().await {
            if attempt > 1 {
                debug!("probe satisfied on attempt {}", attempt);
            }
            return Some(value);
        }
        if attempt < config.max_attempts {
            sleep(config.interval).await;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_satisfied_probe() {
        let config = PollConfig::new(10, Duration::from_millis(1));
        let attempts = AtomicU32::new(0);

        let result = poll_until(&config, || async {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            (n == 3).then_some(n)
        })
        .await;

        assert_eq!(result, Some(3));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_returns_none() {
        let config = PollConfig::new(5, Duration::from_millis(1));
        let attempts = AtomicU32::new(0);

        let result: Option<u32> = poll_until(&config, || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            None
        })
        .await;

        assert_eq!(result, None);
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn immediate_hit_skips_the_interval() {
        let config = PollConfig::new(1, Duration::from_secs(60));
        let result = poll_until(&config, || async { Some(42) }).await;
        assert_eq!(result, Some(42));
    }
}
