//! Configuration module - environment variable parsing

use std::env;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Seed for the demo arena RNG (random if unset)
    pub arena_seed: Option<u64>,
    /// Half-extent of the square arena floor, in world units
    pub arena_half_extent: f32,
    /// Maximum vehicles per arena
    pub max_players: usize,

    /// Vehicle identities driven by server-side bots in the demo arena
    pub bot_vehicles: Vec<String>,
    /// Number of players the boss health formula assumes at spawn
    pub boss_player_count: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let arena_seed = match env::var("ARENA_SEED") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                name: "ARENA_SEED",
                value: raw,
            })?),
            Err(_) => None,
        };

        let arena_half_extent = parse_or("ARENA_HALF_EXTENT", 400.0)?;
        let max_players = parse_or("MAX_PLAYERS", 24)?;
        let boss_player_count = parse_or("BOSS_PLAYER_COUNT", 3)?;

        let bot_vehicles = env::var("BOT_VEHICLES")
            .unwrap_or_else(|_| "axel,outlaw,spectre".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            arena_seed,
            arena_half_extent,
            max_players,
            bot_vehicles,
            boss_player_count,
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Unknown weapon type: {0}")]
    UnknownWeapon(String),

    #[error("Unknown pickup type: {0}")]
    UnknownPickup(String),

    #[error("Unknown vehicle identity: {0}")]
    UnknownVehicle(String),
}
