use std::env;
use std::time::Duration;

use ai_analysis::GatewayConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Games with no requests for this long are dropped.
    pub game_idle_ttl: Duration,
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            game_idle_ttl: Duration::from_secs(
                env::var("GAME_IDLE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3600),
            ),
            gateway: GatewayConfig::from_env(),
        }
    }
}
