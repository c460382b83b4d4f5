//! Boundary to an external current-conditions provider.
//!
//! Requests are fire-and-forget: [`WeatherFeed::request`] asks the source
//! for an observation and parks the receiving half of a one-shot channel.
//! The slot is only drained at a weather transition, never mid-tick. If
//! nothing has arrived by then the transition falls back to the stochastic
//! model and a fresh request is issued for the next interval.

use std::sync::Arc;

use serde_json::Value;
use tilth_types::ObservedWeather;
use tilth_world::parse_condition;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, warn};

/// Failures from an external weather source. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The request could not be sent or the connection failed.
    #[error("weather request failed: {0}")]
    Transport(String),

    /// The provider did not answer in time.
    #[error("weather request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// The provider answered with a non-success status.
    #[error("weather provider returned status {0}")]
    Status(u16),

    /// The response body did not have the expected shape.
    #[error("malformed weather payload: {0}")]
    Malformed(String),
}

/// Receiving half of one pending observation.
pub type PendingObservation = oneshot::Receiver<Result<ObservedWeather, FeedError>>;

/// Something that can be asked for current conditions.
///
/// Implementations must return immediately; the answer is delivered
/// through the returned receiver whenever it is ready.
pub trait WeatherSource: Send + Sync {
    /// Start a request for current conditions.
    fn request(&self) -> PendingObservation;
}

/// Holds the optional source and the one-shot slot for its next answer.
#[derive(Default)]
pub struct WeatherFeed {
    source: Option<Arc<dyn WeatherSource>>,
    pending: Option<PendingObservation>,
}

impl std::fmt::Debug for WeatherFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherFeed")
            .field("enabled", &self.source.is_some())
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

impl WeatherFeed {
    /// A feed with no source; every transition is stochastic.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// A feed backed by `source`. No request is issued until
    /// [`prime`](Self::prime) or the first transition.
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self {
            source: Some(source),
            pending: None,
        }
    }

    /// Whether a source is attached.
    pub const fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// Whether a request is in flight or answered but not yet consumed.
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Issue a request if none is outstanding.
    pub fn prime(&mut self) {
        if self.pending.is_none() {
            self.request();
        }
    }

    /// Issue a fresh request, replacing any unanswered one.
    pub fn request(&mut self) {
        if let Some(source) = &self.source {
            self.pending = Some(source.request());
        }
    }

    /// Drain the slot. Called only at a transition boundary.
    ///
    /// Returns the observation if one arrived successfully. Failures,
    /// missing answers and dropped requests are logged and yield `None`.
    pub fn collect(&mut self, tick: u64) -> Option<ObservedWeather> {
        let mut pending = self.pending.take()?;
        match pending.try_recv() {
            Ok(Ok(observation)) => {
                debug!(tick, condition = ?observation.condition, "using observed weather");
                Some(observation)
            }
            Ok(Err(err)) => {
                warn!(tick, error = %err, "weather feed failed, using simulated weather");
                None
            }
            Err(TryRecvError::Empty) => {
                warn!(tick, "weather feed has not answered, using simulated weather");
                None
            }
            Err(TryRecvError::Closed) => {
                warn!(tick, "weather feed request was dropped, using simulated weather");
                None
            }
        }
    }
}

/// Extract an observation from an OpenWeatherMap current-conditions body.
///
/// Reads `weather[0].main`, `main.temp` and `main.humidity`.
pub fn parse_openweather(body: &Value) -> Result<ObservedWeather, FeedError> {
    let label = body
        .get("weather")
        .and_then(|w| w.get(0))
        .and_then(|w| w.get("main"))
        .and_then(Value::as_str)
        .ok_or_else(|| FeedError::Malformed("missing weather[0].main".to_owned()))?;
    let main = body
        .get("main")
        .ok_or_else(|| FeedError::Malformed("missing main".to_owned()))?;
    let temperature = main
        .get("temp")
        .and_then(Value::as_f64)
        .filter(|t| t.is_finite())
        .ok_or_else(|| FeedError::Malformed("missing main.temp".to_owned()))?;
    let humidity = main
        .get("humidity")
        .and_then(Value::as_f64)
        .filter(|h| h.is_finite())
        .ok_or_else(|| FeedError::Malformed("missing main.humidity".to_owned()))?;
    Ok(ObservedWeather {
        condition: parse_condition(label),
        temperature,
        humidity,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use tilth_types::ConditionCategory;

    use super::*;

    struct Instant(Result<ObservedWeather, FeedError>);

    impl WeatherSource for Instant {
        fn request(&self) -> PendingObservation {
            let (tx, rx) = oneshot::channel();
            let _ = tx.send(self.0.clone());
            rx
        }
    }

    struct Silent(std::sync::Mutex<Vec<oneshot::Sender<Result<ObservedWeather, FeedError>>>>);

    impl WeatherSource for Silent {
        fn request(&self) -> PendingObservation {
            let (tx, rx) = oneshot::channel();
            self.0.lock().unwrap().push(tx);
            rx
        }
    }

    fn rain() -> ObservedWeather {
        ObservedWeather {
            condition: ConditionCategory::Rain,
            temperature: 18.0,
            humidity: 88.0,
        }
    }

    #[test]
    fn answered_request_is_collected_once() {
        let mut feed = WeatherFeed::new(Arc::new(Instant(Ok(rain()))));
        feed.prime();
        assert!(feed.has_pending());
        assert_eq!(feed.collect(15), Some(rain()));
        assert_eq!(feed.collect(30), None);
    }

    #[test]
    fn failure_falls_back() {
        let mut feed = WeatherFeed::new(Arc::new(Instant(Err(FeedError::Status(401)))));
        feed.prime();
        assert_eq!(feed.collect(15), None);
        assert!(!feed.has_pending());
    }

    #[test]
    fn unanswered_request_falls_back() {
        let source = Arc::new(Silent(std::sync::Mutex::new(Vec::new())));
        let mut feed = WeatherFeed::new(source.clone());
        feed.prime();
        assert_eq!(feed.collect(15), None);
        feed.request();
        assert_eq!(source.0.lock().unwrap().len(), 2);
    }

    #[test]
    fn disabled_feed_never_requests() {
        let mut feed = WeatherFeed::disabled();
        feed.prime();
        assert!(!feed.has_pending());
        assert_eq!(feed.collect(1), None);
    }

    #[test]
    fn parses_openweather_body() {
        let body = json!({
            "weather": [{"main": "Thunderstorm", "description": "heavy"}],
            "main": {"temp": 27.4, "humidity": 91}
        });
        let observed = parse_openweather(&body).unwrap();
        assert_eq!(observed.condition, ConditionCategory::Storm);
        assert!((observed.temperature - 27.4).abs() < 1e-9);
        assert!((observed.humidity - 91.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_body_is_rejected() {
        let body = json!({"weather": [], "main": {"temp": 20.0}});
        assert!(matches!(
            parse_openweather(&body),
            Err(FeedError::Malformed(_))
        ));
    }
}
