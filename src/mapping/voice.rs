//! Voice signal state machine
//!
//! ```text
//!            rising edge (no active pulse)
//!   Idle ─────────────────────────────────► Pulsing { until = now + 60 ms }
//!    ▲                                          │
//!    └────────────── now >= until ──────────────┘
//! ```
//!
//! Hold mode bypasses the states and mirrors the button. In both modes the
//! previous button level is tracked so switching modes mid-press does not fire
//! a stale edge.

use crate::persistence::VoiceMode;
use std::time::{Duration, Instant};
use tracing::debug;

/// Fixed width of a voice pulse
pub const VOICE_PULSE_WIDTH: Duration = Duration::from_millis(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceState {
    Idle,
    Pulsing { until: Instant },
}

#[derive(Clone, Debug)]
pub struct VoiceSignal {
    state: VoiceState,
    previous_down: bool,
}

impl Default for VoiceSignal {
    fn default() -> Self {
        Self {
            state: VoiceState::Idle,
            previous_down: false,
        }
    }
}

impl VoiceSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Advances one tick and returns the voice value to transmit (0 or 1)
    pub fn update(&mut self, mode: VoiceMode, voice_down: bool, now: Instant) -> i32 {
        let rising = voice_down && !self.previous_down;
        self.previous_down = voice_down;

        if let VoiceState::Pulsing { until } = self.state {
            if now >= until {
                self.state = VoiceState::Idle;
            }
        }

        match mode {
            VoiceMode::Hold => i32::from(voice_down),
            VoiceMode::Pulse => {
                if rising && self.state == VoiceState::Idle {
                    debug!("Voice pulse started");
                    self.state = VoiceState::Pulsing {
                        until: now + VOICE_PULSE_WIDTH,
                    };
                }
                i32::from(matches!(self.state, VoiceState::Pulsing { until } if now < until))
            }
        }
    }

    /// Forgets the last button level and cancels any pending pulse
    pub fn reset(&mut self) {
        self.state = VoiceState::Idle;
        self.previous_down = false;
    }
}
