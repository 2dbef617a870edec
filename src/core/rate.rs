//! Rate retrieval abstractions and core types

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("rate service API key is missing")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(String),

    #[error("rate service returned status {0}")]
    Status(u16),

    #[error("rate service returned no observations")]
    NoData,

    #[error("rate service reported a missing observation")]
    MissingObservation,

    #[error("could not parse observation value {0:?}")]
    Unparsable(String),

    #[error("no rate available after {attempts} attempt(s): {reason}")]
    Unavailable { attempts: usize, reason: String },
}

/// Where a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Cache,
    Live,
}

/// A successfully obtained rate with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub rate: f64,
    pub source: RateSource,
}

/// A live source of the current rate for one configured series.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rate(&self) -> Result<f64, RateError>;

    /// Informational origin label recorded alongside cached values.
    fn source_label(&self) -> &str;
}
