use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initialize a `tracing_subscriber`
///
/// If `debug` is `false` then only `error!`, `warn!` and `info!` are reported.
/// If `debug` is `true` then `debug!` events are reported too.
///
/// The `RUST_LOG` environment variable, when set, takes precedence over `debug`.
pub fn initialise_tracing_subscriber(debug: bool) {
    let log_level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
