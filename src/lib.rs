pub mod classifier;
pub mod config;
pub mod diet;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for hosts that don't install their own subscriber.
///
/// `RUST_LOG` overrides the built-in filter when set.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Labsight starting v{}", config::APP_VERSION);
}
