//! Tracing initialisation for runbridge binaries.
//!
//! Call [`init_tracing`] once at startup; repeated calls are silently
//! ignored because the global subscriber can only be installed once per
//! process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `json` switches to newline-delimited JSON log lines for aggregation
/// pipelines; `level` is the default verbosity when `RUST_LOG` is not set
/// (`RUST_LOG` always wins for fine-grained filtering).
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(false).compact())
            .try_init()
            .ok();
    }
}
