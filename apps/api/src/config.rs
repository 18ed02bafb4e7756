use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values abort startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub simulation: SimulationConfig,
    pub refresh_interval: Duration,
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Fixed processing interval between steps.
    pub step_delay: Duration,
    /// Wait each action's `delay_minutes` instead of `step_delay`.
    pub honor_action_delays: bool,
    /// Probability in [0, 1] that a step succeeds.
    pub success_rate: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(1500),
            honor_action_delays: false,
            success_rate: 0.9,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let success_rate: f64 = parse_env("SIM_SUCCESS_RATE", 0.9)?;
        if !(0.0..=1.0).contains(&success_rate) {
            anyhow::bail!("SIM_SUCCESS_RATE must be between 0 and 1, got {success_rate}");
        }

        let refresh_secs: u64 = parse_env("REFRESH_INTERVAL_SECS", 30)?;
        if refresh_secs == 0 {
            anyhow::bail!("REFRESH_INTERVAL_SECS must be at least 1");
        }

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            simulation: SimulationConfig {
                step_delay: Duration::from_millis(parse_env("SIM_STEP_DELAY_MS", 1500)?),
                honor_action_delays: parse_env("SIM_HONOR_ACTION_DELAYS", false)?,
                success_rate,
            },
            refresh_interval: Duration::from_secs(refresh_secs),
            seed_demo_data: parse_env("SEED_DEMO_DATA", true)?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
