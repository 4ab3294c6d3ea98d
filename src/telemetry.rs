use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Fallback for the CLI: sync progress from this crate at info, and only
/// sqlx warnings (slow statements, pool timeouts). reqwest stays silent.
pub const DEFAULT_FILTER: &str = "pitchsync=info,sqlx=warn,reqwest=warn";

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`,
/// e.g. `RUST_LOG=pitchsync::sync=debug` to see per-page and per-fixture lines.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
