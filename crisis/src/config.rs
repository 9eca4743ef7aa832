use std::{path::Path, time::Duration};

use crate::error::ConfigError;

pub const DEFAULT_LLM_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Every tunable of a game. Values missing from a config file take their
/// defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub game_duration_secs: u64,
    pub tick_interval_secs: u64,
    pub crisis_event_interval_secs: u64,
    pub deterioration_interval_secs: u64,
    pub stability_floor: u8,
    pub gas_event_increment: u8,
    pub lease_duration_secs: u32,
    pub countdown_step_secs: u32,
    pub max_transmissions: u32,
    pub transmission_cooldown_secs: f64,
    pub max_message_chars: usize,
    pub policy_timeout_secs: f64,
    pub status_interval_secs: u64,
    pub recent_message_window: usize,
    pub urgency_threshold: f64,
    pub rng_seed: Option<u64>,
    pub llm_model: String,
    pub export_dir: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            game_duration_secs: 60,
            tick_interval_secs: 5,
            crisis_event_interval_secs: 15,
            deterioration_interval_secs: 20,
            stability_floor: 2,
            gas_event_increment: 2,
            lease_duration_secs: 5,
            countdown_step_secs: 10,
            max_transmissions: 50,
            transmission_cooldown_secs: 0.01,
            max_message_chars: 12,
            policy_timeout_secs: 10.0,
            status_interval_secs: 60,
            recent_message_window: 10,
            urgency_threshold: 0.7,
            rng_seed: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            export_dir: ".".to_string(),
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<GameConfig, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str::<GameConfig>(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_secs == 0 {
            return Err(ConfigError::Invalid("tick_interval_secs must be positive".into()));
        }
        if self.max_message_chars == 0 {
            return Err(ConfigError::Invalid("max_message_chars must be positive".into()));
        }
        if self.stability_floor > 10 {
            return Err(ConfigError::Invalid("stability_floor must be within 0..=10".into()));
        }
        if !(self.policy_timeout_secs.is_finite() && self.policy_timeout_secs > 0.0) {
            return Err(ConfigError::Invalid("policy_timeout_secs must be a positive number".into()));
        }
        if !(self.transmission_cooldown_secs.is_finite() && self.transmission_cooldown_secs >= 0.0) {
            return Err(ConfigError::Invalid("transmission_cooldown_secs must not be negative".into()));
        }
        if !(0.0..=1.0).contains(&self.urgency_threshold) {
            return Err(ConfigError::Invalid("urgency_threshold must be within 0..=1".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn policy_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.policy_timeout_secs)
    }

    pub fn transmission_cooldown(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.transmission_cooldown_secs * 1000.0).round() as i64)
    }
}
