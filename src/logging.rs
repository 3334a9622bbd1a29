//! Tracing setup for the binaries.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "SCENARIO_RISK_LOG";

static INIT: Once = Once::new();

/// Installs the global subscriber once.
///
/// Levels come from `SCENARIO_RISK_LOG` (e.g. `scenario_risk=debug`), falling
/// back to `scenario_risk=info`. Logs go to stderr so report output on
/// stdout stays clean.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("scenario_risk=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
