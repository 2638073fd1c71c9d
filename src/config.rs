//! Monitor configuration parameters
//!
//! Tunable parameters for the serial link, the acquisition cadence and the
//! display refresh, plus the operator-supplied tank height.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default tank height before the operator submits one (cm).
pub const DEFAULT_TANK_HEIGHT_CM: f32 = 1000.0;

/// Core monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // --- Serial link ---
    /// Line speed in baud
    pub baud_rate: u32,
    /// Upper bound on a single frame read (milliseconds)
    pub read_timeout_ms: u32,

    // --- Acquisition ---
    /// Pause between acquisition cycles (milliseconds)
    pub poll_interval_ms: u32,
    /// Consecutive read/parse failures before the link is dropped
    pub max_consecutive_failures: u32,
    /// Tank height used until the operator submits one (cm)
    pub default_tank_height_cm: f32,

    // --- Display ---
    /// Shell refresh cadence (milliseconds)
    pub refresh_interval_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // Serial link
            baud_rate: 9600,
            read_timeout_ms: 1000,

            // Acquisition
            poll_interval_ms: 1000, // 1 Hz
            max_consecutive_failures: 5,
            default_tank_height_cm: DEFAULT_TANK_HEIGHT_CM,

            // Display
            refresh_interval_ms: 200,
        }
    }
}

impl MonitorConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baud_rate == 0 {
            return Err(ConfigError::ValidationFailed("baud_rate must be > 0"));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("read_timeout_ms must be > 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be > 0"));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_consecutive_failures must be >= 1",
            ));
        }
        if !self.default_tank_height_cm.is_finite() || self.default_tank_height_cm < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "default_tank_height_cm must be finite and >= 0",
            ));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("refresh_interval_ms must be > 0"));
        }
        Ok(())
    }

    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            baud_rate: self.baud_rate,
            read_timeout: Duration::from_millis(u64::from(self.read_timeout_ms)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.refresh_interval_ms))
    }

    pub fn default_tank(&self) -> TankConfig {
        TankConfig::new(self.default_tank_height_cm)
    }
}

/// Parameters handed to a transport when opening a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        MonitorConfig::default().link_settings()
    }
}

// ---------------------------------------------------------------------------
// Tank height
// ---------------------------------------------------------------------------

/// Distance from the sensor to the tank bottom, in centimetres.
///
/// A height of zero (or anything not strictly positive) means level
/// computation is disabled and the last published level stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankConfig {
    pub height_cm: f32,
}

impl TankConfig {
    /// Sentinel stored after invalid operator input.
    pub const DISABLED: Self = Self { height_cm: 0.0 };

    pub const fn new(height_cm: f32) -> Self {
        Self { height_cm }
    }

    /// Parse the operator's tank-height field.
    ///
    /// The trimmed text must be a finite number greater than zero.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let height: f32 = input
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidHeight)?;
        if !height.is_finite() || height <= 0.0 {
            return Err(ConfigError::InvalidHeight);
        }
        Ok(Self::new(height))
    }

    pub fn is_enabled(&self) -> bool {
        self.height_cm.is_finite() && self.height_cm > 0.0
    }
}

impl Default for TankConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TANK_HEIGHT_CM)
    }
}
