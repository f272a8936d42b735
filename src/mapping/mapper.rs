//! Raw gamepad state to semantic signals

use crate::controller::RawControllerState;
use crate::mapping::normalize::{apply_curve, normalize_stick, normalize_trigger};
use crate::persistence::BridgeConfig;

/// Per-tick signals derived from one poll
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MappedInput {
    pub move_x: f32,
    pub move_y: f32,
    pub look_x: f32,
    pub look_y: f32,
    pub jump: bool,
    pub voice_down: bool,
    pub grab_left: f32,
    pub grab_right: f32,
}

/// Applies deadzones, inversion, look curve/gain and button lookups
pub fn map_state(raw: &RawControllerState, cfg: &BridgeConfig) -> MappedInput {
    let tuning = &cfg.tuning;

    let move_x = normalize_stick(raw.thumb_lx, tuning.deadzone_left);
    let move_y = invert_if(
        normalize_stick(raw.thumb_ly, tuning.deadzone_left),
        tuning.move_invert_y,
    );

    let look = |axis: i16| {
        let shaped = apply_curve(normalize_stick(axis, tuning.deadzone_right), tuning.curve_gamma);
        (shaped * tuning.look_gain).clamp(-1.0, 1.0)
    };
    let look_x = look(raw.thumb_rx);
    let look_y = invert_if(look(raw.thumb_ry), tuning.look_invert_y);

    let (grab_left, grab_right) = if cfg.buttons.enable_grab_triggers {
        (
            normalize_trigger(raw.left_trigger, tuning.trigger_threshold),
            normalize_trigger(raw.right_trigger, tuning.trigger_threshold),
        )
    } else {
        (0.0, 0.0)
    };

    MappedInput {
        move_x,
        move_y,
        look_x,
        look_y,
        jump: raw.is_pressed(cfg.buttons.jump_button),
        voice_down: raw.is_pressed(cfg.buttons.voice_button),
        grab_left,
        grab_right,
    }
}

fn invert_if(value: f32, invert: bool) -> f32 {
    if invert {
        -value
    } else {
        value
    }
}
