//! Cache-first rate fetching with bounded retry.
//!
//! The upstream API is rate limited and the series updates far less often
//! than check cycles may run, so a fresh cached value short-circuits the
//! live call entirely. Retries use a fixed delay; the outer scheduler
//! already bounds call frequency, so backoff growth buys nothing here.

use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::core::cache::{CachedRate, RateCache};
use crate::core::rate::{RateError, RateProvider, RateQuote, RateSource};

/// Total live attempts per fetch, including the first.
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Fixed delay between live attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

pub struct RateFetcher<P: RateProvider> {
    provider: P,
    cache: RateCache,
    max_retries: usize,
    retry_delay: Duration,
}

impl<P: RateProvider> RateFetcher<P> {
    pub fn new(provider: P, cache: RateCache) -> Self {
        RateFetcher {
            provider,
            cache,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_policy(mut self, max_retries: usize, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Returns a fresh cached quote when one exists, otherwise attempts a
    /// live fetch with up to `max_retries` total attempts. A live success
    /// refreshes the cache; a cache write failure never fails the fetch.
    pub async fn fetch(&self) -> Result<RateQuote, RateError> {
        if let Some(entry) = self.cache.read() {
            return Ok(RateQuote {
                rate: entry.rate,
                source: RateSource::Cache,
            });
        }

        let mut attempt = 1;
        loop {
            match self.provider.fetch_rate().await {
                Ok(rate) => {
                    self.cache.write(&CachedRate {
                        rate,
                        timestamp: Utc::now(),
                        source: self.provider.source_label().to_string(),
                    });
                    return Ok(RateQuote {
                        rate,
                        source: RateSource::Live,
                    });
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(RateError::Unavailable {
                            attempts: attempt,
                            reason: err.to_string(),
                        });
                    }
                    debug!(
                        "Attempt {}/{} failed: {}. Retrying in {:?}...",
                        attempt, self.max_retries, err, self.retry_delay
                    );
                    attempt += 1;
                    sleep(self.retry_delay).await;
                }
            }
        }
    }
}
