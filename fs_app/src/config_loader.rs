use std::path::Path;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use fs_limiter::LimiterConfig;
use serde::Deserialize;

/// Default config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "flowstop.toml";

/// Settings for the `flowstop` binary
///
/// Read from a TOML file, then overridden by `FLOWSTOP_*` environment
/// variables (e.g. `FLOWSTOP_LIMIT=10`). Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub redis_url: String,
    pub namespace: String,
    pub interval_ms: u64,
    pub limit: u64,
    pub log_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1/".to_string(),
            namespace: "flowstop".to_string(),
            interval_ms: 60_000,
            limit: 60,
            log_dir: "./logs".to_string(),
        }
    }
}

impl AppConfig {
    /// Limiter settings; validated when the limiter is built
    pub fn limiter_config(&self) -> LimiterConfig {
        LimiterConfig::new(self.namespace.clone(), Duration::from_millis(self.interval_ms), self.limit)
    }
}

/// Prefix of the environment variables overriding file settings
pub const ENV_PREFIX: &str = "FLOWSTOP";

/// Load app config from `path`, layered with `FLOWSTOP_*` overrides
///
/// A missing file is not an error: the environment still applies on top of the
/// defaults. A file that exists but does not parse is.
pub fn load_app_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    load_app_config_with_env(path, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
}

/// Same as [`load_app_config`] with an explicit environment source
pub fn load_app_config_with_env<P: AsRef<Path>>(path: P, env: Environment) -> Result<AppConfig, ConfigError> {
    let config = Config::builder().add_source(File::from(path.as_ref()).required(false)).add_source(env).build()?;

    config.try_deserialize()
}
