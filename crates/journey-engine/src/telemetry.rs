//! Tracing subscriber setup

use crate::config::LogConfig;
use crate::error::JourneyError;
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `log.filter`. Later calls are no-ops.
///
/// # Errors
/// - `JourneyError::Config` if the filter directive is invalid or another
///   subscriber was installed elsewhere
pub fn init_tracing(log: &LogConfig) -> Result<(), JourneyError> {
    INSTALLED
        .get_or_try_init(|| {
            let filter = match EnvFilter::try_from_default_env() {
                Ok(filter) => filter,
                Err(_) => EnvFilter::try_new(&log.filter)
                    .map_err(|e| JourneyError::Config(format!("log.filter: {e}")))?,
            };

            let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
            let installed = if log.json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            installed.map_err(|e| JourneyError::Config(format!("tracing subscriber: {e}")))
        })
        .map(|_| ())
}
