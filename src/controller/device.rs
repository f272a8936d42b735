//! Raw gamepad state and the device access capability
//!
//! The transmission loop never talks to a gamepad backend directly. It asks a
//! [`DeviceAdapter`] for the state of a slot and gets back either a
//! [`RawControllerState`] or nothing.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Number of controller slots searched during enumeration (XInput user indices 0..3)
pub const MAX_DEVICE_SLOTS: usize = 4;

/// One poll of a gamepad, laid out like an XInput report
///
/// Sticks are signed 16 bit, triggers unsigned 8 bit, and the digital buttons
/// are packed into a bitmask using [`ButtonType::mask`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawControllerState {
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

impl RawControllerState {
    /// Returns true if `button` is held in this report. [`ButtonType::None`] never is.
    pub fn is_pressed(&self, button: ButtonType) -> bool {
        let mask = button.mask();
        mask != 0 && self.buttons & mask != 0
    }

    /// Sets or clears a button bit
    pub fn set_button(&mut self, button: ButtonType, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }
}

/// Closed vocabulary of assignable digital buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ButtonType {
    #[default]
    None,
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    Back,
    Start,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

impl ButtonType {
    pub const ALL: [ButtonType; 15] = [
        ButtonType::None,
        ButtonType::A,
        ButtonType::B,
        ButtonType::X,
        ButtonType::Y,
        ButtonType::LeftBumper,
        ButtonType::RightBumper,
        ButtonType::Back,
        ButtonType::Start,
        ButtonType::LeftStick,
        ButtonType::RightStick,
        ButtonType::DPadUp,
        ButtonType::DPadDown,
        ButtonType::DPadLeft,
        ButtonType::DPadRight,
    ];

    /// XInput bit for this button
    pub fn mask(self) -> u16 {
        match self {
            ButtonType::None => 0,
            ButtonType::DPadUp => 0x0001,
            ButtonType::DPadDown => 0x0002,
            ButtonType::DPadLeft => 0x0004,
            ButtonType::DPadRight => 0x0008,
            ButtonType::Start => 0x0010,
            ButtonType::Back => 0x0020,
            ButtonType::LeftStick => 0x0040,
            ButtonType::RightStick => 0x0080,
            ButtonType::LeftBumper => 0x0100,
            ButtonType::RightBumper => 0x0200,
            ButtonType::A => 0x1000,
            ButtonType::B => 0x2000,
            ButtonType::X => 0x4000,
            ButtonType::Y => 0x8000,
        }
    }

    /// Short name used in the config file
    pub fn name(self) -> &'static str {
        match self {
            ButtonType::None => "None",
            ButtonType::A => "A",
            ButtonType::B => "B",
            ButtonType::X => "X",
            ButtonType::Y => "Y",
            ButtonType::LeftBumper => "LB",
            ButtonType::RightBumper => "RB",
            ButtonType::Back => "Back",
            ButtonType::Start => "Start",
            ButtonType::LeftStick => "LS",
            ButtonType::RightStick => "RS",
            ButtonType::DPadUp => "Up",
            ButtonType::DPadDown => "Down",
            ButtonType::DPadLeft => "Left",
            ButtonType::DPadRight => "Right",
        }
    }

    /// Lenient lookup: accepts the short names, the long editor labels
    /// ("LS (L3)", "DPad Up") and is case-insensitive. Returns `None` for
    /// anything unknown.
    pub fn parse(name: &str) -> Option<ButtonType> {
        let key: String = name
            .split('(')
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        let button = match key.as_str() {
            "none" | "" => ButtonType::None,
            "a" => ButtonType::A,
            "b" => ButtonType::B,
            "x" => ButtonType::X,
            "y" => ButtonType::Y,
            "lb" | "leftbumper" => ButtonType::LeftBumper,
            "rb" | "rightbumper" => ButtonType::RightBumper,
            "back" | "select" => ButtonType::Back,
            "start" => ButtonType::Start,
            "ls" | "l3" | "leftstick" => ButtonType::LeftStick,
            "rs" | "r3" | "rightstick" => ButtonType::RightStick,
            "up" | "dpadup" => ButtonType::DPadUp,
            "down" | "dpaddown" => ButtonType::DPadDown,
            "left" | "dpadleft" => ButtonType::DPadLeft,
            "right" | "dpadright" => ButtonType::DPadRight,
            _ => return None,
        };
        Some(button)
    }
}

impl From<String> for ButtonType {
    fn from(value: String) -> Self {
        ButtonType::parse(&value).unwrap_or_else(|| {
            warn!("Unknown button name '{}', treating as None", value);
            ButtonType::None
        })
    }
}

impl From<ButtonType> for String {
    fn from(button: ButtonType) -> Self {
        button.name().to_string()
    }
}

impl fmt::Display for ButtonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while bringing up a gamepad backend
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to initialize gamepad backend: {0}")]
    InitializationError(String),
}

/// Capability for reading gamepad state by slot index
///
/// Implementations must return promptly; the loop calls this once per tick.
pub trait DeviceAdapter {
    /// Current state of the device in `slot`, or `None` if nothing answers there
    fn poll_state(&mut self, slot: usize) -> Option<RawControllerState>;

    /// First slot in `0..MAX_DEVICE_SLOTS` that answers a poll
    fn enumerate(&mut self) -> Option<usize> {
        let found = (0..MAX_DEVICE_SLOTS).find(|&slot| self.poll_state(slot).is_some());
        debug!("Device enumeration result: {:?}", found);
        found
    }
}

/// Adapter for platforms or sessions without a usable gamepad backend
///
/// Every poll reports the device as absent, which keeps the failsafe in charge.
#[derive(Debug, Default)]
pub struct NoDeviceAdapter;

impl DeviceAdapter for NoDeviceAdapter {
    fn poll_state(&mut self, _slot: usize) -> Option<RawControllerState> {
        None
    }
}
