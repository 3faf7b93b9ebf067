//! Logger bootstrap for binaries and embedders.

use crate::types::Config;

/// Install `env_logger` with the configured default level.
///
/// Output goes to stderr so stdout stays free for view JSON. `RUST_LOG`
/// takes precedence. Calling this twice is harmless: the second
/// call leaves the first logger in place.
pub fn init(config: &Config) {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    if let Err(e) = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .try_init()
    {
        log::debug!("Logger already initialized: {}", e);
    }
}
