//! Structured logging for the engine, via the `tracing` ecosystem.
//!
//! One console layer with an env-filter: `RUST_LOG` wins, then the config's
//! `debug.log_level`, then a quiet default. Worker threads are named at
//! spawn, so thread names in the output identify the pool a line came from.

use rampart_config::EngineConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when neither `RUST_LOG` nor the config says otherwise.
const DEFAULT_FILTER: &str = "info";

/// Initializes the global tracing subscriber.
///
/// Call once at startup, before constructing the scheduler. Returns quietly
/// if a subscriber is already installed (useful under test harnesses that
/// race to initialize).
pub fn init_logging(config: Option<&EngineConfig>) {
    let fallback = config
        .map(|c| c.debug.log_level.as_str())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
