use super::models::Config;
use crate::dispatch::Targets;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "NOTIFYBOX_CONFIG";
const TARGETS_ENV_VAR: &str = "NOTIFYBOX_TARGETS";
const DEFAULT_CONFIG_PATH: &str = "config/notifybox.toml";
const ENV_PREFIX: &str = "NOTIFYBOX";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    load_with(None)
}

/// Same as [`load`], with an explicit file taking precedence over `NOTIFYBOX_CONFIG`
pub fn load_with(path: Option<PathBuf>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = path.unwrap_or_else(|| {
        env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    });

    let mut config = load_from_sources(config_path)?;

    load_secrets(&mut config);

    Ok(config)
}

/// Target URLs embed credentials, so they are also accepted from the environment
fn load_secrets(config: &mut Config) {
    if let Ok(raw) = env::var(TARGETS_ENV_VAR) {
        apply_targets(config, &raw);
    }
}

fn apply_targets(config: &mut Config, raw: &str) {
    let targets = Targets::parse(raw);
    if !targets.is_empty() {
        config.dispatch.targets = targets.into_vec();
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // NOTIFYBOX__DISPATCH__THROTTLE -> dispatch.throttle
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
