use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber. `RUST_LOG` takes priority
/// over `default_directives` when set.
pub fn init(default_directives: &str) {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    // Only fails if a subscriber is already installed
    if let Err(e) = result {
        tracing::debug!("Tracing already initialized: {}", e);
    }
}
