//! FRED (Federal Reserve Economic Data) observations provider.
//!
//! One GET against the series observations endpoint, newest observation
//! first, limit 1. FRED marks a day with no observation with the literal
//! value `"."`, which is "no data", not a number.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::rate::{RateError, RateProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org";

/// 10-Year Treasury constant maturity rate.
pub const DEFAULT_SERIES: &str = "DGS10";

const MISSING_VALUE_SENTINEL: &str = ".";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FredProvider {
    base_url: String,
    api_key: String,
    series_id: String,
    source_label: String,
}

impl FredProvider {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        series_id: &str,
    ) -> Result<Self, RateError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or(RateError::MissingApiKey)?;

        Ok(FredProvider {
            base_url: base_url.to_string(),
            api_key,
            series_id: series_id.to_string(),
            source_label: format!("FRED/{series_id}"),
        })
    }
}

#[derive(Deserialize, Debug)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Deserialize, Debug)]
struct Observation {
    value: String,
}

#[async_trait]
impl RateProvider for FredProvider {
    #[instrument(
        name = "FredRateFetch",
        skip(self),
        fields(series = %self.series_id)
    )]
    async fn fetch_rate(&self) -> Result<f64, RateError> {
        let url = format!("{}/fred/series/observations", self.base_url);
        debug!("Requesting latest observation from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("ratewatch/0.2")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RateError::Request(e.to_string()))?;

        let response = client
            .get(&url)
            .query(&[
                ("series_id", self.series_id.as_str()),
                ("api_key", self.api_key.as_str()),
                ("sort_order", "desc"),
                ("limit", "1"),
                ("file_type", "json"),
            ])
            .send()
            .await
            .map_err(|e| RateError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RateError::Status(response.status().as_u16()));
        }

        let data = response
            .json::<ObservationsResponse>()
            .await
            .map_err(|e| RateError::Request(format!("unexpected response body: {e}")))?;

        let observation = data.observations.first().ok_or(RateError::NoData)?;
        if observation.value == MISSING_VALUE_SENTINEL {
            return Err(RateError::MissingObservation);
        }

        let rate: f64 = observation
            .value
            .parse()
            .map_err(|_| RateError::Unparsable(observation.value.clone()))?;
        debug!("Latest {} observation: {rate}%", self.series_id);
        Ok(rate)
    }

    fn source_label(&self) -> &str {
        &self.source_label
    }
}
