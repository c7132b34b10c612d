use tracing_subscriber::EnvFilter;

/// Installs a test writer subscriber, filtered by `RUST_LOG` and defaulting to `debug`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .compact()
        .try_init();
}
