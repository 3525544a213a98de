use std::{env, str::FromStr, time::Duration};

use did_utils::methods::{MethodRegistry, RetryOptions};
use tracing::warn;

const DEFAULT_RESOLVER_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RESOLVER_RETRIES: usize = 2;

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on a single DID resolution.
    pub resolver_timeout: Duration,
    /// Retries of transient `did:web` fetch failures.
    pub resolver_retries: usize,
    /// Whether successful resolutions are cached.
    pub resolver_cache: bool,
    /// Log level of the command-line tool.
    pub log_level: tracing::Level,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolver_timeout: Duration::from_secs(DEFAULT_RESOLVER_TIMEOUT_SECS),
            resolver_retries: DEFAULT_RESOLVER_RETRIES,
            resolver_cache: true,
            log_level: tracing::Level::INFO,
        }
    }
}

impl EngineConfig {
    /// Loads `.env` files, then reads the configuration from the environment.
    pub fn load() -> Self {
        // Load dotenv-flow variables
        dotenv_flow::dotenv_flow().ok();
        Self::from_env()
    }

    /// Reads the configuration from the environment only.
    ///
    /// Unset variables take their default; invalid ones too, with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            resolver_timeout: read_var("VC_RESOLVER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.resolver_timeout),
            resolver_retries: read_var("VC_RESOLVER_RETRIES").unwrap_or(defaults.resolver_retries),
            resolver_cache: read_var("VC_RESOLVER_CACHE").unwrap_or(defaults.resolver_cache),
            log_level: read_var("VC_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Registry of the supported DID methods, set up with these settings.
    pub fn method_registry(&self) -> MethodRegistry {
        MethodRegistry::with_default_methods(RetryOptions::new().retries(self.resolver_retries))
            .with_timeout(self.resolver_timeout)
            .with_cache(self.resolver_cache)
    }
}

fn read_var<T: FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring invalid value {value:?} for {name}");
            None
        }
    }
}
