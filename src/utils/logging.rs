use tracing::Level;

/// Maps a configured level name to a `tracing` level.
///
/// Matching ignores case and accepts `warning` as well as `warn`; anything
/// unrecognised means `info`.
pub fn parse_level(name: &str) -> Level {
    match name.to_ascii_lowercase().as_str() {
        "warning" => Level::WARN,
        other => other.parse().unwrap_or(Level::INFO),
    }
}

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// Only the first call in a process takes effect.
pub fn init(level: &str) {
    let installed = tracing_subscriber::fmt()
        .with_max_level(parse_level(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::trace!("subscriber already installed, keeping it");
    }
}
