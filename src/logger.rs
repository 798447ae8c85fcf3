use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Call once, before anything logs.
/// `RUST_LOG` overrides the default filter; repeated calls are no-ops so
/// tests can init freely.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("seltrans=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
