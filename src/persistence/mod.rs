//! # Persistence Module
//!
//! Holds the configuration snapshot the engine runs on and the store it is
//! loaded from.
//!
//! ## Key Abstractions
//! - **Snapshot**: [`BridgeConfig`] is an immutable value. The loop replaces it
//!   wholesale on reload and never edits it in place.
//! - **Sections**: network, tuning, buttons, addresses and suppression settings
//!   are separate serde structs so each TOML table falls back to its own defaults.
//! - **Sanitizing**: [`BridgeConfig::sanitized`] pulls every out-of-range value
//!   back to something the normalizer and the loop can run with.
//!
//! ## Error Handling Strategy
//! Missing keys take their defaults. A file that fails to parse is an error for
//! the caller, who keeps whatever snapshot it already had.

pub mod config_store;

use crate::controller::ButtonType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;

pub use config_store::{ensure_default_config, ConfigError, ConfigSource, FileConfigStore};

pub const MIN_SEND_RATE_HZ: u32 = 10;
pub const MAX_SEND_RATE_HZ: u32 = 1000;
pub const MAX_DEADZONE: u32 = 20000;
pub const MAX_TRIGGER_THRESHOLD: u32 = 255;
pub const MAX_FAILSAFE_TIMEOUT_SEC: f64 = 60.0;

/// Fixed OSC addresses for the grab triggers; not user editable
pub const GRAB_LEFT_ADDRESS: &str = "/input/GrabLeft";
pub const GRAB_RIGHT_ADDRESS: &str = "/input/GrabRight";

/// How the voice button is turned into the transmitted voice value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VoiceMode {
    /// 60 ms high pulse per press, for toggle-style voice
    #[default]
    Pulse,
    /// Mirrors the button, for push-to-talk
    Hold,
}

impl From<String> for VoiceMode {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pulse" => VoiceMode::Pulse,
            "hold" => VoiceMode::Hold,
            other => {
                warn!("Unknown voice mode '{}', using pulse", other);
                VoiceMode::Pulse
            }
        }
    }
}

impl From<VoiceMode> for String {
    fn from(mode: VoiceMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for VoiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceMode::Pulse => write!(f, "pulse"),
            VoiceMode::Hold => write!(f, "hold"),
        }
    }
}

/// Where and how often frames are sent
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
    pub send_rate_hz: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
            send_rate_hz: 60,
        }
    }
}

/// Stick, trigger and failsafe tuning
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TuningConfig {
    /// Left stick deadzone in raw units (0-20000)
    pub deadzone_left: u32,
    /// Right stick deadzone in raw units (0-20000)
    pub deadzone_right: u32,
    /// Trigger reading at or below which grab stays 0 (0-255)
    pub trigger_threshold: u32,
    pub move_invert_y: bool,
    pub look_invert_y: bool,
    pub look_gain: f32,
    /// 1.0 is linear, larger values soften the center
    pub curve_gamma: f32,
    pub failsafe_timeout_sec: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            deadzone_left: 7849,
            deadzone_right: 8689,
            trigger_threshold: 30,
            move_invert_y: false,
            look_invert_y: false,
            look_gain: 1.0,
            curve_gamma: 1.0,
            failsafe_timeout_sec: 0.25,
        }
    }
}

/// Button assignments
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ButtonConfig {
    pub jump_button: ButtonType,
    pub voice_button: ButtonType,
    pub voice_mode: VoiceMode,
    /// LT/RT drive the grab addresses
    pub enable_grab_triggers: bool,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            jump_button: ButtonType::A,
            voice_button: ButtonType::Y,
            voice_mode: VoiceMode::Pulse,
            enable_grab_triggers: true,
        }
    }
}

/// OSC addresses for every transmitted signal
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AddressConfig {
    pub move_x: String,
    pub move_y: String,
    pub look_x: String,
    pub look_y: String,
    pub jump: String,
    pub voice: String,
    pub grab_left: String,
    pub grab_right: String,
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self {
            move_x: "/input/Horizontal".to_string(),
            move_y: "/input/Vertical".to_string(),
            look_x: "/input/LookHorizontal".to_string(),
            look_y: "/input/LookVertical".to_string(),
            jump: "/input/Jump".to_string(),
            voice: "/input/Voice".to_string(),
            grab_left: GRAB_LEFT_ADDRESS.to_string(),
            grab_right: GRAB_RIGHT_ADDRESS.to_string(),
        }
    }
}

/// Foreground-application suppression
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SuppressionConfig {
    pub enabled: bool,
    /// Executable name compared case-insensitively with the foreground process
    pub process_name: String,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            process_name: "VRChat.exe".to_string(),
        }
    }
}

/// Complete settings snapshot the engine runs on
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub network: NetworkConfig,
    pub tuning: TuningConfig,
    pub buttons: ButtonConfig,
    pub addresses: AddressConfig,
    pub suppression: SuppressionConfig,
}

impl BridgeConfig {
    /// Parses a TOML document and sanitizes the result
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: BridgeConfig = toml::from_str(content)?;
        Ok(parsed.sanitized())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns a copy with every field pulled into its valid range
    pub fn sanitized(mut self) -> Self {
        let defaults = BridgeConfig::default();

        let hz = self.network.send_rate_hz;
        let clamped_hz = hz.clamp(MIN_SEND_RATE_HZ, MAX_SEND_RATE_HZ);
        if clamped_hz != hz {
            warn!("send_rate_hz {} out of range, using {}", hz, clamped_hz);
            self.network.send_rate_hz = clamped_hz;
        }

        if self.network.port == 0 {
            warn!("port 0 is not a valid target, using {}", defaults.network.port);
            self.network.port = defaults.network.port;
        }

        let tuning = &mut self.tuning;
        tuning.deadzone_left = clamp_logged("deadzone_left", tuning.deadzone_left, MAX_DEADZONE);
        tuning.deadzone_right = clamp_logged("deadzone_right", tuning.deadzone_right, MAX_DEADZONE);
        tuning.trigger_threshold = clamp_logged(
            "trigger_threshold",
            tuning.trigger_threshold,
            MAX_TRIGGER_THRESHOLD,
        );

        if !(tuning.look_gain.is_finite() && tuning.look_gain > 0.0) {
            warn!("look_gain {} invalid, using {}", tuning.look_gain, defaults.tuning.look_gain);
            tuning.look_gain = defaults.tuning.look_gain;
        }
        if !(tuning.curve_gamma.is_finite() && tuning.curve_gamma >= 1.0) {
            warn!(
                "curve_gamma {} invalid, using {}",
                tuning.curve_gamma, defaults.tuning.curve_gamma
            );
            tuning.curve_gamma = defaults.tuning.curve_gamma;
        }
        if !(tuning.failsafe_timeout_sec.is_finite() && tuning.failsafe_timeout_sec > 0.0) {
            warn!(
                "failsafe_timeout_sec {} invalid, using {}",
                tuning.failsafe_timeout_sec, defaults.tuning.failsafe_timeout_sec
            );
            tuning.failsafe_timeout_sec = defaults.tuning.failsafe_timeout_sec;
        } else if tuning.failsafe_timeout_sec > MAX_FAILSAFE_TIMEOUT_SEC {
            warn!(
                "failsafe_timeout_sec {} out of range, using {}",
                tuning.failsafe_timeout_sec, MAX_FAILSAFE_TIMEOUT_SEC
            );
            tuning.failsafe_timeout_sec = MAX_FAILSAFE_TIMEOUT_SEC;
        }

        self.addresses.grab_left = GRAB_LEFT_ADDRESS.to_string();
        self.addresses.grab_right = GRAB_RIGHT_ADDRESS.to_string();
        self
    }

    /// `max(1 ms, 1 / send_rate_hz)`
    pub fn tick_period(&self) -> Duration {
        let hz = self.network.send_rate_hz.max(1);
        Duration::from_secs_f64(1.0 / hz as f64).max(Duration::from_millis(1))
    }

    /// Never panics, even on a snapshot that skipped [`sanitized`](Self::sanitized)
    pub fn failsafe_timeout(&self) -> Duration {
        let secs = self
            .tuning
            .failsafe_timeout_sec
            .clamp(0.0, MAX_FAILSAFE_TIMEOUT_SEC);
        Duration::try_from_secs_f64(secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(MAX_FAILSAFE_TIMEOUT_SEC))
    }
}

fn clamp_logged(name: &str, value: u32, max: u32) -> u32 {
    if value > max {
        warn!("{} {} out of range, using {}", name, value, max);
        max
    } else {
        value
    }
}
