//! Extension pour gérer la configuration de la scène dans pmoconfig
//!
//! Clés utilisées :
//! - `stage.default_volume` : volume initial (0-100)
//! - `stage.websocket.ping_interval` : période des pings WebSocket (secondes)
//! - `stage.websocket.ping_timeout` : silence toléré avant fermeture (secondes)

use std::time::Duration;

use anyhow::{Result, anyhow};
use pmoconfig::Config;
use serde_yaml::Value;

pub use crate::stage::DEFAULT_VOLUME;
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_PING_TIMEOUT_SECS: u64 = 60;

/// Trait d'extension pour la configuration de pmostage
pub trait StageConfigExt {
    fn get_default_volume(&self) -> Result<u8>;

    fn set_default_volume(&self, volume: u8) -> Result<()>;

    fn get_ws_ping_interval(&self) -> Result<Duration>;

    fn get_ws_ping_timeout(&self) -> Result<Duration>;

    fn set_ws_keepalive(&self, ping_interval: Duration, ping_timeout: Duration) -> Result<()>;
}

impl StageConfigExt for Config {
    fn get_default_volume(&self) -> Result<u8> {
        match self.get_value(&["stage", "default_volume"]) {
            Ok(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .filter(|v| *v <= 100)
                .ok_or_else(|| anyhow!("stage.default_volume out of range: {}", n)),
            Ok(_) | Err(_) => Ok(DEFAULT_VOLUME),
        }
    }

    fn set_default_volume(&self, volume: u8) -> Result<()> {
        if volume > 100 {
            return Err(anyhow!("Volume must be between 0 and 100, got {}", volume));
        }
        self.set_value(&["stage", "default_volume"], Value::Number(volume.into()))
    }

    fn get_ws_ping_interval(&self) -> Result<Duration> {
        seconds(self, &["stage", "websocket", "ping_interval"], DEFAULT_PING_INTERVAL_SECS)
    }

    fn get_ws_ping_timeout(&self) -> Result<Duration> {
        seconds(self, &["stage", "websocket", "ping_timeout"], DEFAULT_PING_TIMEOUT_SECS)
    }

    fn set_ws_keepalive(&self, ping_interval: Duration, ping_timeout: Duration) -> Result<()> {
        self.set_value(
            &["stage", "websocket", "ping_interval"],
            Value::Number(ping_interval.as_secs().into()),
        )?;
        self.set_value(
            &["stage", "websocket", "ping_timeout"],
            Value::Number(ping_timeout.as_secs().into()),
        )
    }
}

fn seconds(config: &Config, path: &[&str], default: u64) -> Result<Duration> {
    match config.get_value(path) {
        Ok(Value::Number(n)) => match n.as_u64() {
            Some(0) | None => Err(anyhow!("{} must be a positive number of seconds", path.join("."))),
            Some(secs) => Ok(Duration::from_secs(secs)),
        },
        Ok(_) | Err(_) => Ok(Duration::from_secs(default)),
    }
}
