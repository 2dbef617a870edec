//! Core abstractions for the rate monitor

pub mod cache;
pub mod config;
pub mod log;
pub mod notify;
pub mod rate;

// Re-export main types for cleaner imports
pub use config::{Condition, ConfigError, ConfigStore, MonitorConfig};
pub use notify::{Notifier, NotifyError};
pub use rate::{RateError, RateProvider, RateQuote, RateSource};
