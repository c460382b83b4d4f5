//! Current conditions from the `OpenWeatherMap` API.
//!
//! Each request runs on its own Tokio task bounded by the configured
//! timeout. The answer lands in the feed's one-shot slot; the tick loop
//! never waits for it.

use std::time::Duration;

use tilth_core::config::WeatherProviderConfig;
use tilth_core::feed::{PendingObservation, parse_openweather};
use tilth_core::{FeedError, WeatherSource};
use tilth_types::ObservedWeather;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::debug;

/// A [`WeatherSource`] backed by `OpenWeatherMap`'s current-weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherSource {
    client: reqwest::Client,
    base_url: String,
    city: String,
    api_key: String,
    timeout_ms: u64,
}

impl OpenWeatherSource {
    /// Create a source from provider configuration.
    pub fn new(config: &WeatherProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            city: config.city.clone(),
            api_key: config.api_key.clone(),
            timeout_ms: config.request_timeout_ms,
        }
    }

    async fn fetch(self) -> Result<ObservedWeather, FeedError> {
        let timeout_ms = self.timeout_ms;
        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.fetch_unbounded()).await {
            Ok(result) => result,
            Err(_elapsed) => Err(FeedError::Timeout { timeout_ms }),
        }
    }

    async fn fetch_unbounded(self) -> Result<ObservedWeather, FeedError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", self.city.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FeedError::Malformed(e.to_string()))?;
        parse_openweather(&body)
    }
}

impl WeatherSource for OpenWeatherSource {
    fn request(&self) -> PendingObservation {
        let (tx, rx) = oneshot::channel();
        match Handle::try_current() {
            Ok(handle) => {
                let source = self.clone();
                handle.spawn(async move {
                    let result = source.fetch().await;
                    debug!(ok = result.is_ok(), "weather provider answered");
                    // The feed may have been dropped; nothing to do then.
                    let _ = tx.send(result);
                });
            }
            Err(e) => {
                let _ = tx.send(Err(FeedError::Transport(format!("no async runtime: {e}"))));
            }
        }
        rx
    }
}
