//! Board configuration.
//!
//! Defaults match a typical tournament day: 15-minute rows, 20-minute
//! matches when no estimate is known, and a 07:00-20:00 window when
//! nothing has been placed yet.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Default grid granularity (minutes per slot).
pub const DEFAULT_GRANULARITY_MINUTES: u32 = 15;
/// Duration assumed for encounters without an estimate.
pub const DEFAULT_DURATION_MINUTES: u32 = 20;
/// Padding added on both sides of the time axis after hour rounding.
pub const DEFAULT_PADDING_MINUTES: u32 = 60;

/// Tunable parameters of the scheduling board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Initial grid granularity (minutes per slot).
    pub granularity_minutes: u32,
    /// Duration used when an encounter has no estimate (minutes).
    pub default_duration_minutes: u32,
    /// Axis window used when no encounter is assigned.
    pub fallback_window: FallbackWindow,
    /// Padding on both sides of the axis (minutes).
    pub padding_minutes: u32,
    /// Whether auto-scheduling must avoid courts occupied by other divisions.
    pub respect_resource_overlap: bool,
}

/// Time-of-day window shown on an empty board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for FallbackWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            granularity_minutes: DEFAULT_GRANULARITY_MINUTES,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            fallback_window: FallbackWindow::default(),
            padding_minutes: DEFAULT_PADDING_MINUTES,
            respect_resource_overlap: true,
        }
    }
}

impl BoardConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, BoardError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BoardError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the initial grid granularity.
    pub fn with_granularity(mut self, minutes: u32) -> Self {
        self.granularity_minutes = minutes;
        self
    }

    /// Sets the default encounter duration.
    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration_minutes = minutes;
        self
    }

    /// Sets the empty-board window.
    pub fn with_fallback_window(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.fallback_window = FallbackWindow { start, end };
        self
    }

    /// Sets the axis padding.
    pub fn with_padding(mut self, minutes: u32) -> Self {
        self.padding_minutes = minutes;
        self
    }

    /// Sets whether auto-scheduling respects other divisions' court usage.
    pub fn with_respect_resource_overlap(mut self, respect: bool) -> Self {
        self.respect_resource_overlap = respect;
        self
    }

    /// Checks the configuration for values the board cannot work with.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.granularity_minutes == 0 {
            return Err(BoardError::InvalidGranularity(0));
        }
        if self.default_duration_minutes == 0 {
            return Err(BoardError::InvalidConfig(
                "default_duration_minutes must be positive".into(),
            ));
        }
        if self.fallback_window.start >= self.fallback_window.end {
            return Err(BoardError::InvalidConfig(format!(
                "fallback window {} - {} is empty",
                self.fallback_window.start, self.fallback_window.end
            )));
        }
        Ok(())
    }
}
