use serde::Deserialize;
use tracing::warn;

/// Daemon configuration from `PLACEMENTD_*` environment variables. The UI
/// can also connect a backend at runtime via `backend.connect`, which takes
/// precedence over the env values.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            http_timeout_secs: default_timeout_secs(),
        }
    }
}

pub fn from_env() -> Config {
    match envy::prefixed("PLACEMENTD_").from_env::<Config>() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "invalid PLACEMENTD_* environment, using defaults");
            Config::default()
        }
    }
}
