use {
    std::sync::Once,
    tracing::level_filters::LevelFilter,
    tracing_subscriber::{EnvFilter, fmt::writer::MakeWriterExt as _},
};

/// Initializes the global tracing subscriber.
///
/// `env_filter` uses the `tracing_subscriber::EnvFilter` directive syntax,
/// for example `"warn,basket=debug"`. Events at `stderr_threshold` or above
/// go to stderr, everything else to stdout.
///
/// Panics if a global subscriber was already installed; use
/// [`initialize_reentrant`] from tests.
pub fn initialize(env_filter: &str, stderr_threshold: LevelFilter) {
    set_tracing_subscriber(env_filter, stderr_threshold);
    tracing::info!(%env_filter, "initialized tracing");
}

/// Like [`initialize`] but can be called many times; only the first call has
/// an effect.
pub fn initialize_reentrant(env_filter: &str) {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| set_tracing_subscriber(env_filter, LevelFilter::ERROR));
}

fn set_tracing_subscriber(env_filter: &str, stderr_threshold: LevelFilter) {
    let Some(stderr_level) = stderr_threshold.into_level() else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(env_filter))
            .with_writer(std::io::stdout)
            .init();
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_writer(
            std::io::stderr
                .with_max_level(stderr_level)
                .or_else(std::io::stdout),
        )
        .init();
}
