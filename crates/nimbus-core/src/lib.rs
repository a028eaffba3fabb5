pub mod config;
pub mod store;

pub use config::{Config, EndpointsConfig, ForecastConfig, RadarConfig};
pub use store::{StateStore, FAVORITES_KEY, LAST_LOCATION_KEY};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Nimbus core initialized");
    Ok(())
}
