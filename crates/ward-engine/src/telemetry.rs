//! Tracing subscriber setup for hosts and tests.

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at startup; subsequent calls are no-ops. `RUST_LOG` overrides
/// the given default level.
pub fn init(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init is a no-op if a subscriber is already set.
    let _ = subscriber.try_init();
}
