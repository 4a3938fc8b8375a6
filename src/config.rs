use serde::Deserialize;

use crate::constants::{DEFAULT_KEYBOARD_OFFSET, DEFAULT_KEYBOARD_SIZE, DEFAULT_RESOLUTION};
use crate::error::DecodeError;

/// What happens to a run of active frames that is still open when its measure ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingRunPolicy {
    /// Close the run at the measure boundary and emit it as a note.
    #[default]
    Truncate,
    /// Discard the run.
    Drop,
}

/// How a measure-relative start frame becomes a beat offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetMode {
    /// `(start_frame * resolution) mod numerator`.
    #[default]
    Scaled,
    /// `(start_frame / resolution) mod numerator`.
    Divided,
}

/// Decoding configuration. Built once and shared by reference with every component.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Config {
    /// Frames per beat.
    pub resolution: u32,
    pub keyboard_size: u32,
    /// MIDI number of the lowest keyboard key.
    pub keyboard_offset: u32,
    pub pending_run: PendingRunPolicy,
    pub offset_mode: OffsetMode,
    /// Snap offsets and durations to a strict grid.
    pub quantize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            keyboard_size: DEFAULT_KEYBOARD_SIZE,
            keyboard_offset: DEFAULT_KEYBOARD_OFFSET,
            pending_run: PendingRunPolicy::default(),
            offset_mode: OffsetMode::default(),
            quantize: false,
        }
    }
}

impl Config {
    /// Creates a configuration with the given resolution and the default keyboard.
    pub fn with_resolution(resolution: u32) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, DecodeError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.resolution == 0 {
            return Err(DecodeError::InvalidConfig("RESOLUTION must be at least 1".to_string()));
        }
        if self.keyboard_size == 0 {
            return Err(DecodeError::InvalidConfig("KEYBOARD_SIZE must be at least 1".to_string()));
        }
        if self.keyboard_offset.saturating_add(self.keyboard_size) > 128 {
            return Err(DecodeError::InvalidConfig(format!(
                "keyboard of {} keys from MIDI {} exceeds the MIDI range",
                self.keyboard_size, self.keyboard_offset
            )));
        }
        Ok(())
    }

    /// Returns true when the MIDI number lies on the configured keyboard.
    pub fn on_keyboard(&self, midi: i32) -> bool {
        let low = self.keyboard_offset as i32;
        midi >= low && midi < low + self.keyboard_size as i32
    }
}
