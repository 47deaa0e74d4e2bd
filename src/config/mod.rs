mod settings;

use config::{Config, ConfigError, Environment, File};

pub use settings::{
    BrokerSettings, LogSettings, MIN_PORT, PartialSettings, ServerSettings, Settings, is_valid_port,
};

/// Prefix of environment variables read by [`load_config`], e.g.
/// `PSSERVER__BROKER__MAX_CONNECTIONS=10`.
pub const ENV_PREFIX: &str = "PSSERVER";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the server, broker and log configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::merged(partial))
}
