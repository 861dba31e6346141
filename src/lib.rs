pub mod commands;
pub mod core;

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the launcher settings name one.
pub const DEFAULT_LOG_FILTER: &str = "info,interface_profile=debug";

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Calling it again after a subscriber is installed does nothing.
pub fn init_logging(default_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_LOG_FILTER)));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::info!("InterfaceOficial profile backend starting...");
    }
}
