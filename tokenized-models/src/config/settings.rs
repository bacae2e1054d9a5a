//! Build the settings of an application
//!
//! Sources are merged in order, later ones overriding earlier ones:
//! 1. the file at `TOKENIZED_CONFIG_PATH` (`base_config/config.toml` by default),
//!    which must exist
//! 2. the file at `TOKENIZED_CONFIG_OVERRIDE_PATH` (`config/config.toml` by
//!    default), if present
//! 3. the user configuration directory of the application, if present
//! 4. environment variables starting with `env_prefix`, with `__` separating
//!    nested keys (`TOKENIZED__HOLDINGS__CHANNEL_SIZE`)

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use std::path::Path;

pub fn build_tokenized_settings<T: DeserializeOwned>(
    app_name: &str,
    env_prefix: &str,
) -> Result<T, config::ConfigError> {
    let mut builder = config::Config::builder();
    let config_path = std::env::var("TOKENIZED_CONFIG_PATH")
        .unwrap_or_else(|_| "base_config/config.toml".to_string());

    builder = builder.add_source(config::File::with_name(&config_path));

    let config_override_path = std::env::var("TOKENIZED_CONFIG_OVERRIDE_PATH")
        .unwrap_or_else(|_| "config/config.toml".to_string());

    if Path::new(&config_override_path).is_file() {
        builder = builder.add_source(config::File::with_name(&config_override_path));
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "Tokenized", app_name) {
        let user_config_path = proj_dirs.config_dir().join("config.toml");
        if user_config_path.is_file() {
            builder = builder.add_source(config::File::from(user_config_path));
        }
    }

    builder
        .add_source(config::Environment::with_prefix(env_prefix).separator("__"))
        .build()?
        .try_deserialize()
}
