use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

use crate::controller::device::{
    ButtonType, DeviceAdapter, DeviceError, RawControllerState, MAX_DEVICE_SLOTS,
};

/// Gamepad access through gilrs
///
/// gilrs is event driven: every poll first drains the pending events so the
/// cached per-gamepad state is current, then reads axes and buttons as a
/// snapshot. Slot `n` is the n-th connected gamepad.
#[derive(Debug)]
pub struct GilrsAdapter {
    gilrs: Gilrs,
}

impl GilrsAdapter {
    pub fn create() -> Result<Self, DeviceError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(gilrs::Error::NotImplemented(dummy)) => {
                warn!("gilrs has no backend for this platform, no gamepad will ever be found");
                dummy
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(DeviceError::InitializationError(e.to_string()));
            }
        };

        let adapter = Self { gilrs };
        adapter.log_gamepads();
        Ok(adapter)
    }

    fn log_gamepads(&self) {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();
        if gamepads.is_empty() {
            warn!("No gamepad connected, waiting for one");
            return;
        }
        info!("Found {} gamepads:", gamepads.len());
        for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
            info!(
                "  [{}] ID: {}, Name: {}, UUID: {:?}",
                idx,
                id,
                gamepad.name(),
                gamepad.uuid()
            );
        }
    }

    fn drain_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => info!("Gamepad {} connected", id),
                EventType::Disconnected => warn!("Gamepad {} disconnected", id),
                other => debug!("gilrs event from {}: {:?}", id, other),
            }
        }
    }
}

impl DeviceAdapter for GilrsAdapter {
    fn poll_state(&mut self, slot: usize) -> Option<RawControllerState> {
        if slot >= MAX_DEVICE_SLOTS {
            return None;
        }
        self.drain_events();

        let (_, gamepad) = self.gilrs.gamepads().nth(slot)?;
        if !gamepad.is_connected() {
            return None;
        }
        Some(snapshot(&gamepad))
    }
}

fn snapshot(gamepad: &Gamepad<'_>) -> RawControllerState {
    let mut state = RawControllerState {
        buttons: 0,
        left_trigger: trigger_to_raw(trigger_value(gamepad, Button::LeftTrigger2, Axis::LeftZ)),
        right_trigger: trigger_to_raw(trigger_value(gamepad, Button::RightTrigger2, Axis::RightZ)),
        thumb_lx: axis_to_raw(gamepad.value(Axis::LeftStickX)),
        thumb_ly: axis_to_raw(gamepad.value(Axis::LeftStickY)),
        thumb_rx: axis_to_raw(gamepad.value(Axis::RightStickX)),
        thumb_ry: axis_to_raw(gamepad.value(Axis::RightStickY)),
    };

    for button in GILRS_BUTTONS {
        if gamepad.is_pressed(button) {
            if let Some(button_type) = map_button(button) {
                state.set_button(button_type, true);
            }
        }
    }
    state
}

// Analog triggers show up either as button data or as a Z axis depending on the driver
fn trigger_value(gamepad: &Gamepad<'_>, button: Button, axis: Axis) -> f32 {
    let from_button = gamepad.button_data(button).map(|d| d.value()).unwrap_or(0.0);
    let from_axis = gamepad.value(axis);
    from_button.max(from_axis)
}

/// Scales a gilrs axis value (-1.0..=1.0) to the signed 16 bit stick range
pub fn axis_to_raw(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Scales a trigger value (0.0..=1.0) to the 8 bit trigger range
pub fn trigger_to_raw(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * u8::MAX as f32).round() as u8
}

const GILRS_BUTTONS: [Button; 14] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::Start,
    Button::Select,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

// gilrs uses positional names; South/East/West/North is A/B/X/Y on an Xbox pad
fn map_button(button: Button) -> Option<ButtonType> {
    match button {
        Button::South => Some(ButtonType::A),
        Button::East => Some(ButtonType::B),
        Button::West => Some(ButtonType::X),
        Button::North => Some(ButtonType::Y),
        Button::Start => Some(ButtonType::Start),
        Button::Select => Some(ButtonType::Back),
        Button::LeftTrigger => Some(ButtonType::LeftBumper),
        Button::RightTrigger => Some(ButtonType::RightBumper),
        Button::LeftThumb => Some(ButtonType::LeftStick),
        Button::RightThumb => Some(ButtonType::RightStick),
        Button::DPadUp => Some(ButtonType::DPadUp),
        Button::DPadDown => Some(ButtonType::DPadDown),
        Button::DPadLeft => Some(ButtonType::DPadLeft),
        Button::DPadRight => Some(ButtonType::DPadRight),
        _ => None,
    }
}
