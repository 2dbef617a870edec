//! One monitoring cycle: load config, fetch the rate, evaluate the
//! condition, notify when it is met.
//!
//! Every cycle is self-contained. Aborts log the specific reason and end the
//! cycle; nothing is retained for the next scheduled invocation beyond the
//! config and cache files their stores own.

use chrono::Local;
use tracing::{error, info};

use crate::core::config::{ConfigStore, MonitorConfig};
use crate::core::notify::Notifier;
use crate::core::rate::{RateProvider, RateSource};
use crate::providers::fetcher::RateFetcher;

pub const ALERT_SUBJECT: &str = "Interest rate alert - target condition met";

/// How a cycle ended. Exactly one outcome per invocation; at most one
/// notification per cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    ConfigMissing,
    ConfigInvalid,
    RateUnavailable,
    ConditionNotMet { rate: f64 },
    Notified { rate: f64 },
    NotificationFailed { rate: f64 },
}

pub struct MonitorRunner<'a, P: RateProvider> {
    store: &'a ConfigStore,
    fetcher: &'a RateFetcher<P>,
    notifier: Option<&'a dyn Notifier>,
}

impl<'a, P: RateProvider> MonitorRunner<'a, P> {
    pub fn new(
        store: &'a ConfigStore,
        fetcher: &'a RateFetcher<P>,
        notifier: Option<&'a dyn Notifier>,
    ) -> Self {
        MonitorRunner {
            store,
            fetcher,
            notifier,
        }
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        info!("Starting check cycle");

        let config = match self.store.load() {
            Ok(Some(config)) => config,
            Ok(None) => {
                error!("No configuration found; skipping cycle");
                return CycleOutcome::ConfigMissing;
            }
            Err(e) => {
                error!("Cannot load configuration: {e}; skipping cycle");
                return CycleOutcome::ConfigInvalid;
            }
        };
        if let Err(e) = config.validate() {
            error!("Configuration is incomplete: {e}; skipping cycle");
            return CycleOutcome::ConfigInvalid;
        }

        info!(
            "Watching for a rate {} {}%, notifying {}",
            config.condition, config.target_rate, config.email
        );

        let quote = match self.fetcher.fetch().await {
            Ok(quote) => quote,
            Err(e) => {
                error!("Rate unavailable: {e}; skipping cycle");
                return CycleOutcome::RateUnavailable;
            }
        };
        let origin = match quote.source {
            RateSource::Cache => "cache",
            RateSource::Live => "live",
        };
        info!("Current rate: {}% ({origin})", quote.rate);

        let met = config.condition.is_met(quote.rate, config.target_rate);
        info!("Condition met: {met}");
        if !met {
            return CycleOutcome::ConditionNotMet { rate: quote.rate };
        }

        let Some(notifier) = self.notifier else {
            error!("Notifier unavailable; cannot send notification");
            return CycleOutcome::NotificationFailed { rate: quote.rate };
        };

        let body = alert_body(quote.rate, &config);
        match notifier.send(&config.email, ALERT_SUBJECT, &body).await {
            Ok(()) => {
                info!("Notification sent to {}", config.email);
                CycleOutcome::Notified { rate: quote.rate }
            }
            Err(e) => {
                error!("Failed to send notification: {e}");
                CycleOutcome::NotificationFailed { rate: quote.rate }
            }
        }
    }
}

fn alert_body(current_rate: f64, config: &MonitorConfig) -> String {
    format!(
        "Hello,\n\n\
         The current interest rate has met your configured condition:\n\n\
         Current rate: {current_rate}%\n\
         Target rate: {}%\n\
         Condition: {}\n\n\
         Time: {}\n\n\
         Regards,\n\
         ratewatch",
        config.target_rate,
        config.condition,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::RateCache;
    use crate::core::config::Condition;
    use crate::core::notify::NotifyError;
    use crate::core::rate::RateError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StubProvider {
        rate: Result<f64, ()>,
    }

    #[async_trait]
    impl RateProvider for StubProvider {
        async fn fetch_rate(&self) -> Result<f64, RateError> {
            match self.rate {
                Ok(rate) => Ok(rate),
                Err(()) => Err(RateError::Status(503)),
            }
        }

        fn source_label(&self) -> &str {
            "stub"
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(
            &self,
            recipient: &str,
            subject: &str,
            body: &str,
        ) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push((
                recipient.to_string(),
                subject.to_string(),
                body.to_string(),
            ));
            if self.fail {
                Err(NotifyError::Status(500))
            } else {
                Ok(())
            }
        }
    }

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                dir: TempDir::new().unwrap(),
            }
        }

        fn store(&self) -> ConfigStore {
            ConfigStore::new(self.dir.path().join("config.json"))
        }

        fn fetcher(&self, rate: Result<f64, ()>) -> RateFetcher<StubProvider> {
            RateFetcher::new(
                StubProvider { rate },
                RateCache::new(self.dir.path().join("rate_cache.json")),
            )
            .with_retry_policy(2, Duration::from_millis(1))
        }

        fn save_config(&self) {
            self.store()
                .save(&MonitorConfig {
                    email: "a@b.com".to_string(),
                    target_rate: 4.0,
                    condition: Condition::GreaterOrEqual,
                })
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_condition_met_notifies_once() {
        let fx = Fixture::new();
        fx.save_config();
        let store = fx.store();
        let fetcher = fx.fetcher(Ok(4.5));
        let notifier = RecordingNotifier::default();

        let runner = MonitorRunner::new(&store, &fetcher, Some(&notifier));
        let outcome = runner.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::Notified { rate: 4.5 });
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (recipient, subject, body) = &sent[0];
        assert_eq!(recipient, "a@b.com");
        assert_eq!(subject, ALERT_SUBJECT);
        assert!(body.contains("Current rate: 4.5%"));
        assert!(body.contains("Target rate: 4%"));
        assert!(body.contains("greater than or equal to"));
    }

    #[tokio::test]
    async fn test_condition_not_met_never_notifies() {
        let fx = Fixture::new();
        fx.save_config();
        let store = fx.store();
        let fetcher = fx.fetcher(Ok(3.9));
        let notifier = RecordingNotifier::default();

        let runner = MonitorRunner::new(&store, &fetcher, Some(&notifier));
        let outcome = runner.run_cycle().await;

        assert_eq!(outcome, CycleOutcome::ConditionNotMet { rate: 3.9 });
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_boundary_rate_notifies() {
        let fx = Fixture::new();
        fx.save_config();
        let store = fx.store();
        let fetcher = fx.fetcher(Ok(4.0));
        let notifier = RecordingNotifier::default();

        let runner = MonitorRunner::new(&store, &fetcher, Some(&notifier));
        assert_eq!(
            runner.run_cycle().await,
            CycleOutcome::Notified { rate: 4.0 }
        );
    }

    #[tokio::test]
    async fn test_missing_config_aborts() {
        let fx = Fixture::new();
        let store = fx.store();
        let fetcher = fx.fetcher(Ok(4.5));
        let notifier = RecordingNotifier::default();

        let runner = MonitorRunner::new(&store, &fetcher, Some(&notifier));
        assert_eq!(runner.run_cycle().await, CycleOutcome::ConfigMissing);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_config_aborts() {
        let fx = Fixture::new();
        std::fs::write(fx.dir.path().join("config.json"), "{broken").unwrap();
        let store = fx.store();
        let fetcher = fx.fetcher(Ok(4.5));
        let notifier = RecordingNotifier::default();

        let runner = MonitorRunner::new(&store, &fetcher, Some(&notifier));
        assert_eq!(runner.run_cycle().await, CycleOutcome::ConfigInvalid);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_unavailable_aborts_without_notification() {
        let fx = Fixture::new();
        fx.save_config();
        let store = fx.store();
        let fetcher = fx.fetcher(Err(()));
        let notifier = RecordingNotifier::default();

        let runner = MonitorRunner::new(&store, &fetcher, Some(&notifier));
        assert_eq!(runner.run_cycle().await, CycleOutcome::RateUnavailable);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_downgrades_cycle() {
        let fx = Fixture::new();
        fx.save_config();
        let store = fx.store();
        let fetcher = fx.fetcher(Ok(4.5));
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };

        let runner = MonitorRunner::new(&store, &fetcher, Some(&notifier));
        assert_eq!(
            runner.run_cycle().await,
            CycleOutcome::NotificationFailed { rate: 4.5 }
        );
        // The send was attempted exactly once, with no in-cycle retry
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_notifier_fails_notification() {
        let fx = Fixture::new();
        fx.save_config();
        let store = fx.store();
        let fetcher = fx.fetcher(Ok(4.5));

        let runner = MonitorRunner::<StubProvider>::new(&store, &fetcher, None);
        assert_eq!(
            runner.run_cycle().await,
            CycleOutcome::NotificationFailed { rate: 4.5 }
        );
    }
}
