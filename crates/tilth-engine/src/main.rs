//! Farm engine binary for the Tilth farming simulation.
//!
//! Wires the farm, the operator controls, the observer API and the
//! optional weather provider together and runs the tick loop until a
//! termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tilth-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Restore the farm from its snapshot, or start a new one
//! 4. Attach the `OpenWeatherMap` source when configured
//! 5. Create operator state from simulation bounds
//! 6. Start the observer API server
//! 7. Run the simulation loop
//! 8. Write a final snapshot and log the result

mod error;
mod observer_callback;
mod openweather;
mod persistence;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use tilth_core::config::LoggingConfig;
use tilth_core::{OperatorState, SimulationConfig, SimulationContext, runner};
use tilth_observer::{AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::observer_callback::ObserverCallback;
use crate::openweather::OpenWeatherSource;

/// Default configuration file, relative to the working directory.
const CONFIG_FILE: &str = "tilth-config.yaml";

/// Application entry point for the farm engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        config = %config_path.display(),
        "tilth-engine starting"
    );

    // 3. Restore or create the farm.
    let snapshot_path = PathBuf::from(&config.persistence.snapshot_path);
    let saved = persistence::read_snapshot(&snapshot_path);
    let mut context = SimulationContext::load_or_default(config.clone(), saved.as_deref())
        .context("building the farm")?;
    info!(
        tick = context.tick(),
        season = %context.season(),
        unlocked = context.plots().unlocked_count(),
        "Farm ready"
    );

    // 4. External weather.
    let provider = &config.weather.provider;
    if provider.is_active() {
        context.set_weather_source(Arc::new(OpenWeatherSource::new(provider)));
        info!(city = provider.city, "OpenWeatherMap source attached");
    } else if provider.enabled {
        info!("Weather provider enabled without an API key, using the stochastic model");
    }

    // 5. Operator state.
    let operator = Arc::new(OperatorState::new(
        config.world.tick_interval_ms,
        &config.simulation,
    ));
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );

    // 6. Observer API.
    let app_state = Arc::new(AppState::with_operator(Arc::clone(&operator)));
    app_state.farm.write().await.refresh(&context);
    let _observer_handle = if config.observer.enabled {
        let server = ServerConfig::on_port(config.observer.port);
        let handle = tilth_observer::spawn_observer(&server, Arc::clone(&app_state))
            .await
            .context("starting the observer API")?;
        info!(port = config.observer.port, "Observer API server started");
        Some(handle)
    } else {
        None
    };

    // 7. Run.
    let mut callback = ObserverCallback::new(app_state, &config.persistence);
    let result = runner::run_simulation(&mut context, &operator, &mut callback)
        .await
        .context("running the simulation")?;

    // 8. Final snapshot and results.
    persistence::write_snapshot(&snapshot_path, &context).context("writing the final snapshot")?;
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        snapshot = %snapshot_path.display(),
        "tilth-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from `path`, or defaults if it does not exist.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        Ok(SimulationConfig::parse("")?)
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
