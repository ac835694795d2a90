//! Configuration management for wayfinder.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::navigation::{SessionSettings, Watchdog};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name under the platform config dir.
const APP_DIR_NAME: &str = "wayfinder";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "WAYFINDER_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `WAYFINDER_`, sections split on
///    `__`, e.g. `WAYFINDER_NAVIGATION__VOICE_ENABLED=false`)
/// 2. TOML config file at `~/.config/wayfinder/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Guidance behavior.
    pub navigation: NavigationConfig,
    /// Location feed settings.
    pub location: LocationConfig,
    /// Simulated traffic used by recalculation.
    pub traffic: TrafficConfig,
}

/// Guidance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Distance to a maneuver, in meters, below which the step is complete.
    pub advance_threshold_m: f64,
    /// Minimum seconds between distance reminders.
    pub announce_interval_secs: u64,
    /// Whether voice guidance starts enabled.
    pub voice_enabled: bool,
}

/// Location feed configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Interval between simulated samples in milliseconds.
    pub sample_interval_ms: u64,
    /// Seconds to wait for a first fix before reporting a timeout.
    pub first_fix_timeout_secs: u64,
    /// Seconds of silence after a fix before reporting signal loss.
    pub signal_loss_timeout_secs: u64,
    /// Capacity of the location event channel.
    pub channel_capacity: usize,
    /// Speed of the simulated traveler in meters per second.
    pub walking_speed_mps: f64,
}

/// Traffic simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Smallest delay a recalculation can add, in seconds.
    pub min_delay_secs: u64,
    /// Largest delay a recalculation can add, in seconds.
    pub max_delay_secs: u64,
    /// RNG seed. 0 seeds from entropy.
    pub seed: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            advance_threshold_m: 10.0,
            announce_interval_secs: 10,
            voice_enabled: true,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            first_fix_timeout_secs: 10,
            signal_loss_timeout_secs: 30,
            channel_capacity: 64,
            walking_speed_mps: 1.4,
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 30,
            max_delay_secs: 300,
            seed: 0,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let nav = &self.navigation;
        if !nav.advance_threshold_m.is_finite() || nav.advance_threshold_m <= 0.0 {
            return Err(invalid(format!(
                "advance_threshold_m ({}) must be a positive number",
                nav.advance_threshold_m
            )));
        }
        if nav.announce_interval_secs == 0 {
            return Err(invalid("announce_interval_secs must be greater than 0"));
        }
        if i64::try_from(nav.announce_interval_secs).is_err() {
            return Err(invalid("announce_interval_secs is too large"));
        }

        let loc = &self.location;
        if loc.sample_interval_ms == 0 {
            return Err(invalid("sample_interval_ms must be greater than 0"));
        }
        if loc.first_fix_timeout_secs == 0 {
            return Err(invalid("first_fix_timeout_secs must be greater than 0"));
        }
        if loc.signal_loss_timeout_secs == 0 {
            return Err(invalid("signal_loss_timeout_secs must be greater than 0"));
        }
        if loc.channel_capacity == 0 {
            return Err(invalid("channel_capacity must be greater than 0"));
        }
        if !loc.walking_speed_mps.is_finite() || loc.walking_speed_mps <= 0.0 {
            return Err(invalid(format!(
                "walking_speed_mps ({}) must be a positive number",
                loc.walking_speed_mps
            )));
        }

        if self.traffic.min_delay_secs > self.traffic.max_delay_secs {
            return Err(invalid(format!(
                "min_delay_secs ({}) cannot be greater than max_delay_secs ({})",
                self.traffic.min_delay_secs, self.traffic.max_delay_secs
            )));
        }

        Ok(())
    }

    /// Session tunables derived from this configuration.
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        let interval_secs = i64::try_from(self.navigation.announce_interval_secs).unwrap_or(i64::MAX);
        SessionSettings {
            advance_threshold_m: self.navigation.advance_threshold_m,
            announce_interval: chrono::Duration::try_seconds(interval_secs)
                .unwrap_or(chrono::Duration::MAX),
            voice_enabled: self.navigation.voice_enabled,
            channel_capacity: self.location.channel_capacity,
            min_traffic_delay_s: self.traffic.min_delay_secs,
            max_traffic_delay_s: self.traffic.max_delay_secs,
            traffic_seed: self.traffic.seed,
        }
    }

    /// Watchdog limits for the location feed.
    #[must_use]
    pub fn watchdog(&self) -> Watchdog {
        Watchdog {
            first_fix_timeout: Duration::from_secs(self.location.first_fix_timeout_secs),
            signal_loss_timeout: Duration::from_secs(self.location.signal_loss_timeout_secs),
        }
    }

    /// Get the sample interval as a Duration.
    #[must_use]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.location.sample_interval_ms)
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}
