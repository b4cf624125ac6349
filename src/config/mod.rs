//! Configuration management
//!
//! Layered: serde defaults, then an optional `parley.toml`, then
//! `PARLEY_`-prefixed environment variables.

use crate::domain::negotiation::value_object::MediaConstraints;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub ice: IceConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_video")]
    pub video: bool,
    #[serde(default)]
    pub audio: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceConfig {
    #[serde(default = "default_stun_servers")]
    pub stun_servers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_video() -> bool {
    true
}

fn default_stun_servers() -> Vec<String> {
    vec![
        "stun:stun1.l.google.com:19302".to_string(),
        "stun:stun2.l.google.com:19302".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media: MediaConfig::default(),
            ice: IceConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            video: default_video(),
            audio: false,
        }
    }
}

impl Default for IceConfig {
    fn default() -> Self {
        Self {
            stun_servers: default_stun_servers(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from `parley.toml` (optional) and `PARLEY_*` environment
    /// variables, over the defaults
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("parley").required(false))
            .add_source(config::Environment::with_prefix("PARLEY").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn constraints(&self) -> MediaConstraints {
        MediaConstraints {
            video: self.media.video,
            audio: self.media.audio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert!(config.media.video);
        assert!(!config.media.audio);
        assert_eq!(config.ice.stun_servers.len(), 2);
        assert!(config.ice.stun_servers[0].starts_with("stun:"));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_constraints_mapping() {
        let mut config = Config::default();
        config.media.audio = true;
        let constraints = config.constraints();
        assert!(constraints.video);
        assert!(constraints.audio);
    }
}
