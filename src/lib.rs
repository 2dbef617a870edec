pub mod core;
pub mod editor;
pub mod monitor;
pub mod providers;

use anyhow::Result;
use console::style;
use std::path::PathBuf;

use crate::core::cache::RateCache;
use crate::core::config::{Condition, ConfigStore};
use crate::core::notify::Notifier;
use crate::editor::ConfigEditor;
use crate::monitor::MonitorRunner;
use crate::providers::fetcher::{self, RateFetcher};
use crate::providers::fred::{self, FredProvider};
use crate::providers::sendgrid::{self, SendGridMailer};

pub enum AppCommand {
    Check,
    Show,
    Set {
        email: String,
        target_rate: f64,
        condition: Condition,
    },
    TestEmail {
        recipient: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct FredSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub series_id: String,
}

#[derive(Debug, Clone)]
pub struct SendGridSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub from_email: Option<String>,
}

/// Everything the commands need, assembled once at the boundary so that
/// components receive explicit configuration instead of reading the
/// environment themselves.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub cache_path: PathBuf,
    pub fred: FredSettings,
    pub sendgrid: SendGridSettings,
    /// Total live attempts per fetch.
    pub max_retries: usize,
    pub retry_delay: std::time::Duration,
}

impl Settings {
    pub fn from_env(config_path: Option<&str>, cache_path: Option<&str>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => PathBuf::from(path),
            None => ConfigStore::default_config_path()?,
        };
        let cache_path = match cache_path {
            Some(path) => PathBuf::from(path),
            None => RateCache::default_cache_path()?,
        };

        Ok(Settings {
            config_path,
            cache_path,
            fred: FredSettings {
                base_url: env_or("FRED_BASE_URL", fred::DEFAULT_BASE_URL),
                api_key: std::env::var("FRED_API_KEY").ok(),
                series_id: env_or("FRED_SERIES_ID", fred::DEFAULT_SERIES),
            },
            sendgrid: SendGridSettings {
                base_url: env_or("SENDGRID_BASE_URL", sendgrid::DEFAULT_BASE_URL),
                api_key: std::env::var("SENDGRID_API_KEY").ok(),
                from_email: std::env::var("SENDGRID_FROM_EMAIL").ok(),
            },
            max_retries: fetcher::DEFAULT_MAX_RETRIES,
            retry_delay: fetcher::DEFAULT_RETRY_DELAY,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub async fn run_command(command: AppCommand, settings: Settings) -> Result<()> {
    let store = ConfigStore::new(&settings.config_path);

    match command {
        AppCommand::Check => run_check(&store, &settings).await,
        AppCommand::Show => {
            let config = ConfigEditor::new(&store).current();
            let email = if config.email.is_empty() {
                style("(not set)").dim().to_string()
            } else {
                config.email.clone()
            };
            println!("Email:       {email}");
            println!("Target rate: {}%", config.target_rate);
            println!("Condition:   {}", config.condition);
            Ok(())
        }
        AppCommand::Set {
            email,
            target_rate,
            condition,
        } => {
            let editor = ConfigEditor::new(&store);
            match editor.validate_and_save(&email, target_rate, condition) {
                Ok(config) => {
                    println!("{}", style("Configuration saved.").green().bold());
                    println!(
                        "You will be notified at {} when the rate is {} {}%.",
                        config.email, config.condition, config.target_rate
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("{}", style(&e).red());
                    Err(e.into())
                }
            }
        }
        AppCommand::TestEmail { recipient } => {
            let editor = ConfigEditor::new(&store);
            let recipient = match recipient {
                Some(recipient) => recipient,
                None => {
                    let config = editor.current();
                    if config.email.is_empty() {
                        anyhow::bail!("No recipient given and no email address configured");
                    }
                    config.email
                }
            };

            let mailer = SendGridMailer::new(
                &settings.sendgrid.base_url,
                settings.sendgrid.api_key.clone(),
                settings.sendgrid.from_email.clone(),
            )?;
            match editor.send_test_email(&mailer, &recipient).await {
                Ok(()) => {
                    println!(
                        "{}",
                        style(format!(
                            "Test email sent to {recipient}. Check the inbox (and spam folder)."
                        ))
                        .green()
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("{}", style(&e).red());
                    Err(e.into())
                }
            }
        }
    }
}

/// One scheduled check cycle. Best effort: every failure is logged and the
/// process still exits cleanly, because the scheduler has nobody to show an
/// error to.
async fn run_check(store: &ConfigStore, settings: &Settings) -> Result<()> {
    let provider = match FredProvider::new(
        &settings.fred.base_url,
        settings.fred.api_key.clone(),
        &settings.fred.series_id,
    ) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!("Rate provider unavailable: {e}; skipping cycle");
            return Ok(());
        }
    };
    let fetcher = RateFetcher::new(provider, RateCache::new(&settings.cache_path))
        .with_retry_policy(settings.max_retries, settings.retry_delay);

    // Missing mail credentials only matter once a notification is due.
    let mailer = match SendGridMailer::new(
        &settings.sendgrid.base_url,
        settings.sendgrid.api_key.clone(),
        settings.sendgrid.from_email.clone(),
    ) {
        Ok(mailer) => Some(mailer),
        Err(e) => {
            tracing::warn!("Mailer unavailable ({e}); a met condition cannot be notified");
            None
        }
    };
    let notifier = mailer.as_ref().map(|m| m as &dyn Notifier);

    let runner = MonitorRunner::new(store, &fetcher, notifier);
    let outcome = runner.run_cycle().await;
    tracing::info!("Check cycle finished: {outcome:?}");
    Ok(())
}
