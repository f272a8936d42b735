//! Turns raw controller state into the values that go on the wire.
//!
//! - [`normalize`] - deadzone, trigger threshold and response curve
//! - [`mapper`] - combines normalized axes, buttons and settings into a [`MappedInput`]
//! - [`voice`] - pulse/hold state machine for the voice signal

pub mod mapper;
pub mod normalize;
pub mod voice;

pub use mapper::{map_state, MappedInput};
pub use normalize::{apply_curve, normalize_stick, normalize_trigger};
pub use voice::{VoiceSignal, VoiceState, VOICE_PULSE_WIDTH};
